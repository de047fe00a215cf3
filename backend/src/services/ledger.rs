//! Stock movement ledger
//!
//! Every change to an item's quantity goes through [`apply_entry`] or
//! [`apply_exit`], which update the stock and append the matching movement
//! on the caller's connection. Callers own the transaction, so a compound
//! operation (an assignment, a project deletion) commits or rolls back as a
//! whole.

use std::sync::Arc;

use chrono::Utc;
use shared::{validate_movement_quantity, Item, Movement, MovementInput, MovementKind};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::services::items::{fetch_item, ITEM_COLUMNS};
use crate::services::locations::fetch_project;
use crate::services::notification::{notify_if_low, LowStockNotifier};

/// Ledger service for stock entries and exits
#[derive(Clone)]
pub struct LedgerService {
    db: SqlitePool,
    notifier: Arc<dyn LowStockNotifier>,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: SqlitePool, notifier: Arc<dyn LowStockNotifier>) -> Self {
        Self { db, notifier }
    }

    /// Add stock to an item
    pub async fn record_entry(&self, item_id: i64, input: MovementInput) -> AppResult<Item> {
        check_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;
        if let Some(project_id) = input.project_id {
            fetch_project(&mut tx, project_id).await?;
        }
        let item = apply_entry(
            &mut tx,
            item_id,
            input.quantity,
            input.note.as_deref(),
            input.project_id,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(item_id, quantity = input.quantity, stock = item.quantity, "Stock entry recorded");
        notify_if_low(self.notifier.as_ref(), &item);

        Ok(item)
    }

    /// Take stock out of an item. Fails without any effect when the stock
    /// cannot cover the request.
    pub async fn record_exit(&self, item_id: i64, input: MovementInput) -> AppResult<Item> {
        check_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;
        if let Some(project_id) = input.project_id {
            fetch_project(&mut tx, project_id).await?;
        }
        let item = apply_exit(
            &mut tx,
            item_id,
            input.quantity,
            input.note.as_deref(),
            input.project_id,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(item_id, quantity = input.quantity, stock = item.quantity, "Stock exit recorded");
        notify_if_low(self.notifier.as_ref(), &item);

        Ok(item)
    }

    /// Movements of an item, newest first
    pub async fn history(&self, item_id: i64) -> AppResult<Vec<Movement>> {
        let mut conn = self.db.acquire().await?;
        fetch_item(&mut conn, item_id).await?;

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.item_id, m.kind, m.quantity, m.note, m.project_id,
                   l.name AS project_name, m.created_at
            FROM movements m
            LEFT JOIN locations l ON l.id = m.project_id
            WHERE m.item_id = ?
            ORDER BY m.created_at DESC, m.id DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(movements)
    }
}

fn check_quantity(quantity: i64) -> AppResult<()> {
    validate_movement_quantity(quantity).map_err(|msg| AppError::InvalidQuantity(msg.to_string()))
}

/// Increase an item's stock and append an entry movement.
///
/// SQLite turns an overflowing integer sum into a REAL, so the increment is
/// conditional on the result still fitting in an `i64`.
pub async fn apply_entry(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: i64,
    note: Option<&str>,
    project_id: Option<i64>,
) -> AppResult<Item> {
    check_quantity(quantity)?;

    let updated = sqlx::query_as::<_, Item>(&format!(
        "UPDATE items SET quantity = quantity + ?1, updated_at = ?2 \
         WHERE id = ?3 AND quantity <= ?4 - ?1 RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .bind(i64::MAX)
    .fetch_optional(&mut *conn)
    .await?;

    let item = match updated {
        Some(item) => item,
        None => {
            let current = current_quantity(conn, item_id).await?;
            return Err(AppError::InvalidQuantity(format!(
                "Adding {} units to the current {} exceeds the largest storable quantity",
                quantity, current
            )));
        }
    };

    append_movement(conn, item_id, MovementKind::Entry, quantity, note, project_id).await?;

    Ok(item)
}

/// Decrease an item's stock and append an exit movement.
///
/// The decrement is conditional on the stock covering it, so concurrent
/// exits can never drive a quantity negative.
pub async fn apply_exit(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: i64,
    note: Option<&str>,
    project_id: Option<i64>,
) -> AppResult<Item> {
    check_quantity(quantity)?;

    let updated = sqlx::query_as::<_, Item>(&format!(
        "UPDATE items SET quantity = quantity - ?1, updated_at = ?2 \
         WHERE id = ?3 AND quantity >= ?1 RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    let item = match updated {
        Some(item) => item,
        None => {
            let available = current_quantity(conn, item_id).await?;
            return Err(AppError::InsufficientStock {
                item_id,
                requested: quantity,
                available,
            });
        }
    };

    append_movement(conn, item_id, MovementKind::Exit, quantity, note, project_id).await?;

    Ok(item)
}

/// Stock of an item whose conditional update matched no row
async fn current_quantity(conn: &mut SqliteConnection, item_id: i64) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT quantity FROM items WHERE id = ?")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
}

async fn append_movement(
    conn: &mut SqliteConnection,
    item_id: i64,
    kind: MovementKind,
    quantity: i64,
    note: Option<&str>,
    project_id: Option<i64>,
) -> AppResult<()> {
    let note = note.map(str::trim).filter(|n| !n.is_empty());

    sqlx::query(
        r#"
        INSERT INTO movements (item_id, kind, quantity, note, project_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item_id)
    .bind(kind)
    .bind(quantity)
    .bind(note)
    .bind(project_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
