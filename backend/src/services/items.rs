//! Item store

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use serde::Serialize;
use shared::{CreateItemInput, Item, ItemFilter, UpdateItemInput};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{apply_entry, apply_exit};
use crate::services::notification::{notify_if_low, LowStockNotifier};

pub(crate) const ITEM_COLUMNS: &str = "id, brand, code, description, quantity, minimum, location, \
     serial, cost_price, distributor_price, integrator_price, list_price, image, created_at, updated_at";

const INITIAL_STOCK_NOTE: &str = "Stock inicial";
const ADJUSTMENT_NOTE: &str = "Ajuste manual";

/// Image extensions accepted for upload
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Item listing with the number of low-stock items among the matches
#[derive(Debug, Clone, Serialize)]
pub struct ItemList {
    pub items: Vec<Item>,
    pub low_stock_count: usize,
}

/// Item service
#[derive(Clone)]
pub struct ItemService {
    db: SqlitePool,
    notifier: Arc<dyn LowStockNotifier>,
    upload_dir: PathBuf,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(
        db: SqlitePool,
        notifier: Arc<dyn LowStockNotifier>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            notifier,
            upload_dir: upload_dir.into(),
        }
    }

    /// Create an item. Opening stock is booked as an entry movement.
    pub async fn create(&self, input: CreateItemInput) -> AppResult<Item> {
        let input = input.normalized();
        input.validate()?;

        let mut tx = self.db.begin().await?;
        let item = insert_item(&mut tx, &input).await?;
        tx.commit().await?;

        tracing::info!(item_id = item.id, code = %item.code, "Item created");
        notify_if_low(self.notifier.as_ref(), &item);

        Ok(item)
    }

    /// Get an item by ID
    pub async fn get(&self, item_id: i64) -> AppResult<Item> {
        let mut conn = self.db.acquire().await?;
        fetch_item(&mut conn, item_id).await
    }

    /// Edit an item. A changed quantity is booked as an adjustment movement
    /// so the ledger still explains the stock.
    pub async fn update(&self, item_id: i64, input: UpdateItemInput) -> AppResult<Item> {
        input.validate()?;

        let mut tx = self.db.begin().await?;
        let current = fetch_item(&mut tx, item_id).await?;

        sqlx::query(
            r#"
            UPDATE items
            SET brand = ?, code = ?, description = ?, minimum = ?, location = ?, serial = ?,
                cost_price = ?, distributor_price = ?, integrator_price = ?, list_price = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(trim_or(input.brand, current.brand))
        .bind(trim_or(input.code, current.code))
        .bind(trim_or(input.description, current.description))
        .bind(input.minimum.unwrap_or(current.minimum))
        .bind(trim_or(input.location, current.location))
        .bind(trim_or(input.serial, current.serial))
        .bind(input.cost_price.unwrap_or(current.cost_price))
        .bind(input.distributor_price.unwrap_or(current.distributor_price))
        .bind(input.integrator_price.unwrap_or(current.integrator_price))
        .bind(input.list_price.unwrap_or(current.list_price))
        .bind(Utc::now())
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        let delta = input.quantity.map_or(0, |q| q - current.quantity);
        let item = if delta > 0 {
            apply_entry(&mut tx, item_id, delta, Some(ADJUSTMENT_NOTE), None).await?
        } else if delta < 0 {
            apply_exit(&mut tx, item_id, -delta, Some(ADJUSTMENT_NOTE), None).await?
        } else {
            fetch_item(&mut tx, item_id).await?
        };

        tx.commit().await?;

        tracing::info!(item_id, adjustment = delta, "Item updated");
        if delta != 0 || item.minimum != current.minimum {
            notify_if_low(self.notifier.as_ref(), &item);
        }

        Ok(item)
    }

    /// Delete an item and its movement history. Refused while any of its
    /// stock is checked out to a project.
    pub async fn delete(&self, item_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let item = fetch_item(&mut tx, item_id).await?;

        let allocated = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity_assigned), 0) FROM allocations WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        if allocated > 0 {
            return Err(AppError::Conflict {
                resource: "item".to_string(),
                message: format!("{} units of this item are assigned to projects", allocated),
                message_es: format!("Hay {} unidades de este producto asignadas a proyectos", allocated),
            });
        }

        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Some(image) = &item.image {
            self.remove_image(image).await;
        }
        tracing::info!(item_id, code = %item.code, "Item deleted");

        Ok(())
    }

    /// List items matching a filter, ordered by code
    pub async fn list(&self, filter: &ItemFilter) -> AppResult<ItemList> {
        let items: Vec<Item> = self
            .all_items()
            .await?
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        let low_stock_count = items.iter().filter(|item| item.is_low_stock()).count();

        Ok(ItemList {
            items,
            low_stock_count,
        })
    }

    /// Every item, ordered by code
    pub async fn all_items(&self) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items ORDER BY code, id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Store an uploaded image for an item, replacing any previous one
    pub async fn set_image(&self, item_id: i64, file_name: &str, bytes: &[u8]) -> AppResult<Item> {
        let extension = image_extension(file_name).ok_or_else(|| {
            AppError::validation(
                "image",
                "Image must be a png, jpg, jpeg, gif or webp file",
                "La imagen debe ser png, jpg, jpeg, gif o webp",
            )
        })?;
        if bytes.is_empty() {
            return Err(AppError::validation("image", "Image is empty", "La imagen está vacía"));
        }

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;
        tokio::fs::write(self.upload_dir.join(&stored_name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;

        let swapped = self.swap_image(item_id, &stored_name).await;
        let (previous, item) = match swapped {
            Ok(swapped) => swapped,
            Err(e) => {
                self.remove_image(&stored_name).await;
                return Err(e);
            }
        };

        if let Some(old) = &previous {
            self.remove_image(old).await;
        }

        Ok(item)
    }

    /// Point an item at a new image, returning the name it replaced
    async fn swap_image(
        &self,
        item_id: i64,
        stored_name: &str,
    ) -> AppResult<(Option<String>, Item)> {
        let mut tx = self.db.begin().await?;
        let previous = fetch_item(&mut tx, item_id).await?.image;

        let item = sqlx::query_as::<_, Item>(&format!(
            "UPDATE items SET image = ?, updated_at = ? WHERE id = ? RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(stored_name)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((previous, item))
    }

    /// Path of a stored image
    pub fn image_path(&self, stored_name: &str) -> PathBuf {
        self.upload_dir.join(stored_name)
    }

    async fn remove_image(&self, stored_name: &str) {
        remove_stored_image(&self.upload_dir, stored_name).await;
    }
}

/// Delete a stored image file. A missing file is not an error; other
/// failures are logged and otherwise ignored.
pub(crate) async fn remove_stored_image(upload_dir: &Path, stored_name: &str) {
    let path = upload_dir.join(stored_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove image {}: {}", path.display(), e);
        }
    }
}

/// Load an item on the caller's connection
pub async fn fetch_item(conn: &mut SqliteConnection, item_id: i64) -> AppResult<Item> {
    sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
}

/// Insert a validated item with zero stock, then book its opening stock
pub async fn insert_item(conn: &mut SqliteConnection, input: &CreateItemInput) -> AppResult<Item> {
    let now = Utc::now();

    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
        INSERT INTO items (brand, code, description, quantity, minimum, location, serial,
                           cost_price, distributor_price, integrator_price, list_price,
                           created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        ITEM_COLUMNS
    ))
    .bind(&input.brand)
    .bind(&input.code)
    .bind(&input.description)
    .bind(input.minimum)
    .bind(&input.location)
    .bind(&input.serial)
    .bind(input.cost_price)
    .bind(input.distributor_price)
    .bind(input.integrator_price)
    .bind(input.list_price)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    if input.quantity > 0 {
        return apply_entry(conn, item.id, input.quantity, Some(INITIAL_STOCK_NOTE), None).await;
    }

    Ok(item)
}

fn trim_or(value: Option<String>, current: String) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or(current)
}

fn image_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_image_extensions() {
        assert_eq!(image_extension("foto.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("router.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn rejects_other_files() {
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("noextension"), None);
    }

    #[test]
    fn trim_or_keeps_current_when_absent() {
        assert_eq!(trim_or(None, "Dell".into()), "Dell");
        assert_eq!(trim_or(Some("  HP ".into()), "Dell".into()), "HP");
    }
}
