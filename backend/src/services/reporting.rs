//! Dashboard summary and CSV import/export

use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use shared::{validate_stock_level, CreateItemInput, InventorySummary, Item, ItemFilter};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::items::{insert_item, remove_stored_image, ITEM_COLUMNS};
use crate::services::notification::{notify_if_low, LowStockNotifier};

/// Full catalogue row, in the column layout the importer reads
#[derive(Debug, Serialize)]
struct CatalogueRow<'a> {
    #[serde(rename = "MARCA")]
    brand: &'a str,
    #[serde(rename = "CODIGO")]
    code: &'a str,
    #[serde(rename = "DESCRIPCION")]
    description: &'a str,
    #[serde(rename = "CANTIDAD")]
    quantity: i64,
    #[serde(rename = "MINIMO")]
    minimum: i64,
    #[serde(rename = "UBICACION")]
    location: &'a str,
    #[serde(rename = "SERIAL")]
    serial: &'a str,
    #[serde(rename = "PRECIO_COSTO")]
    cost_price: f64,
    #[serde(rename = "PRECIO_DIST")]
    distributor_price: f64,
    #[serde(rename = "PRECIO_INT")]
    integrator_price: f64,
    #[serde(rename = "PRECIO_GENERAL")]
    list_price: f64,
}

impl<'a> From<&'a Item> for CatalogueRow<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            brand: &item.brand,
            code: &item.code,
            description: &item.description,
            quantity: item.quantity,
            minimum: item.minimum,
            location: &item.location,
            serial: &item.serial,
            cost_price: item.cost_price,
            distributor_price: item.distributor_price,
            integrator_price: item.integrator_price,
            list_price: item.list_price,
        }
    }
}

/// Short row for hand-picked items
#[derive(Debug, Serialize)]
struct SelectedRow<'a> {
    #[serde(rename = "CODIGO")]
    code: &'a str,
    #[serde(rename = "DESCRIPCION")]
    description: &'a str,
    #[serde(rename = "CANTIDAD")]
    quantity: i64,
}

impl<'a> From<&'a Item> for SelectedRow<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            code: &item.code,
            description: &item.description,
            quantity: item.quantity,
        }
    }
}

/// Items a replacing import may remove
const UNALLOCATED: &str = "id NOT IN (SELECT DISTINCT item_id FROM allocations)";

/// Imported CSV row. Cells are read as text so blanks can default to zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    #[serde(rename = "MARCA")]
    brand: String,
    #[serde(rename = "CODIGO")]
    code: String,
    #[serde(rename = "DESCRIPCION")]
    description: String,
    #[serde(rename = "CANTIDAD")]
    quantity: String,
    #[serde(rename = "MINIMO")]
    minimum: String,
    #[serde(rename = "UBICACION", alias = "UBICACIÓN")]
    location: String,
    #[serde(rename = "SERIAL")]
    serial: String,
    #[serde(rename = "PRECIO_COSTO")]
    cost_price: String,
    #[serde(rename = "PRECIO_DIST")]
    distributor_price: String,
    #[serde(rename = "PRECIO_INT")]
    integrator_price: String,
    #[serde(rename = "PRECIO_GENERAL")]
    list_price: String,
}

impl ImportRow {
    fn into_input(self, line: u64) -> AppResult<CreateItemInput> {
        let input = CreateItemInput {
            brand: self.brand,
            code: self.code,
            description: self.description,
            quantity: parse_count(&self.quantity, "CANTIDAD", line)?,
            minimum: parse_count(&self.minimum, "MINIMO", line)?,
            location: self.location,
            serial: self.serial,
            cost_price: parse_price(&self.cost_price, "PRECIO_COSTO", line)?,
            distributor_price: parse_price(&self.distributor_price, "PRECIO_DIST", line)?,
            integrator_price: parse_price(&self.integrator_price, "PRECIO_INT", line)?,
            list_price: parse_price(&self.list_price, "PRECIO_GENERAL", line)?,
        }
        .normalized();

        input.validate().map_err(|_| {
            AppError::validation(
                "file",
                &format!("Line {}: brand, code and description are required", line),
                &format!("Línea {}: marca, código y descripción son obligatorios", line),
            )
        })?;

        Ok(input)
    }
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: SqlitePool,
    notifier: Arc<dyn LowStockNotifier>,
    upload_dir: PathBuf,
}

impl ReportingService {
    /// Create a new ReportingService instance
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

    /// Dashboard counters
    pub async fn summary(&self) -> AppResult<InventorySummary> {
        let (total_items, low_stock_items, total_units) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN quantity <= minimum THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(quantity), 0)
            FROM items
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let active_projects = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM locations WHERE kind = 'project' AND active = 1",
        )
        .fetch_one(&self.db)
        .await?;

        let allocated_units = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity_assigned), 0) FROM allocations",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(InventorySummary {
            total_items,
            low_stock_items,
            total_units,
            active_projects,
            allocated_units,
        })
    }

    /// Items matching a filter as CSV, every column. The output can be
    /// imported again as is.
    pub async fn export_items_csv(&self, filter: &ItemFilter) -> AppResult<String> {
        let items: Vec<Item> = self
            .load_items()
            .await?
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        let rows: Vec<CatalogueRow> = items.iter().map(CatalogueRow::from).collect();
        Self::export_to_csv(&rows)
    }

    /// Selected items as CSV, in catalogue order. Unknown IDs are skipped.
    pub async fn export_selected_csv(&self, ids: &[i64]) -> AppResult<String> {
        let items: Vec<Item> = self
            .load_items()
            .await?
            .into_iter()
            .filter(|item| ids.contains(&item.id))
            .collect();
        let rows: Vec<SelectedRow> = items.iter().map(SelectedRow::from).collect();
        Self::export_to_csv(&rows)
    }

    /// Import items from a semicolon-delimited file. All rows are inserted
    /// in one transaction; any bad row aborts the whole import.
    pub async fn import_items_csv(&self, body: &[u8], replace: bool) -> AppResult<usize> {
        let inputs = parse_import(body)?;

        let mut tx = self.db.begin().await?;

        let mut orphaned_images = Vec::new();
        if replace {
            orphaned_images = sqlx::query_scalar::<_, String>(&format!(
                "SELECT image FROM items WHERE image IS NOT NULL AND {}",
                UNALLOCATED
            ))
            .fetch_all(&mut *tx)
            .await?;

            let removed = sqlx::query(&format!("DELETE FROM items WHERE {}", UNALLOCATED))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tracing::info!(removed, "Cleared unallocated items before import");
        }

        let mut imported = Vec::with_capacity(inputs.len());
        for input in &inputs {
            imported.push(insert_item(&mut tx, input).await?);
        }

        tx.commit().await?;

        for image in &orphaned_images {
            remove_stored_image(&self.upload_dir, image).await;
        }
        tracing::info!(count = imported.len(), replace, "Items imported");
        for item in &imported {
            notify_if_low(self.notifier.as_ref(), item);
        }

        Ok(imported.len())
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    async fn load_items(&self) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items ORDER BY code, id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }
}

fn parse_import(body: &[u8]) -> AppResult<Vec<CreateItemInput>> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body);

    let mut inputs = Vec::new();
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        // Header is line 1
        let line = index as u64 + 2;
        let row = record.map_err(|e| {
            AppError::validation(
                "file",
                &format!("Line {}: unreadable row ({})", line, e),
                &format!("Línea {}: fila ilegible ({})", line, e),
            )
        })?;
        inputs.push(row.into_input(line)?);
    }

    if inputs.is_empty() {
        return Err(AppError::validation(
            "file",
            "The file contains no items",
            "El archivo no contiene productos",
        ));
    }

    Ok(inputs)
}

fn parse_count(cell: &str, column: &str, line: u64) -> AppResult<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    // Spreadsheets often write whole counts as "12.0"
    let value = cell
        .parse::<i64>()
        .ok()
        .or_else(|| {
            cell.replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64)
        })
        .filter(|v| validate_stock_level(*v).is_ok());

    value.ok_or_else(|| bad_cell(column, line))
}

fn parse_price(cell: &str, column: &str, line: u64) -> AppResult<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| bad_cell(column, line))
}

fn bad_cell(column: &str, line: u64) -> AppError {
    AppError::validation(
        "file",
        &format!("Line {}: invalid value in {}", line, column),
        &format!("Línea {}: valor inválido en {}", line, column),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "MARCA;CODIGO;DESCRIPCION;CANTIDAD;MINIMO;UBICACIÓN;SERIAL;PRECIO_COSTO;PRECIO_DIST;PRECIO_INT;PRECIO_GENERAL";

    #[test]
    fn parses_rows_with_accented_header() {
        let body = format!(
            "{}\nDell;DL-001;Laptop Dell Latitude 5420;10;5;ALMACÉN;SN12345;850,5;900;950;1000\n",
            HEADER
        );
        let inputs = parse_import(body.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].code, "DL-001");
        assert_eq!(inputs[0].location, "ALMACÉN");
        assert_eq!(inputs[0].quantity, 10);
        assert_eq!(inputs[0].cost_price, 850.5);
    }

    #[test]
    fn blank_numbers_default_to_zero() {
        let body = format!("{}\nHP;HP-002;Impresora;;;BODEGA;;;;;\n", HEADER);
        let inputs = parse_import(body.as_bytes()).unwrap();
        assert_eq!(inputs[0].quantity, 0);
        assert_eq!(inputs[0].minimum, 0);
        assert_eq!(inputs[0].list_price, 0.0);
    }

    #[test]
    fn negative_count_is_rejected_with_line() {
        let body = format!("{}\nHP;HP-002;Impresora;-3;0;BODEGA;;;;;\n", HEADER);
        match parse_import(body.as_bytes()) {
            Err(AppError::Validation { message, .. }) => assert!(message.contains("Line 2")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_code_is_rejected() {
        let body = format!("{}\nHP;;Impresora;1;0;BODEGA;;;;;\n", HEADER);
        assert!(parse_import(body.as_bytes()).is_err());
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(parse_import(HEADER.as_bytes()).is_err());
    }

    #[test]
    fn export_uses_semicolons() {
        let rows = vec![SelectedRow {
            code: "LG-003",
            description: "Mouse",
            quantity: 25,
        }];
        let csv = ReportingService::export_to_csv(&rows).unwrap();
        assert_eq!(csv, "CODIGO;DESCRIPCION;CANTIDAD\nLG-003;Mouse;25\n");
    }

    #[test]
    fn catalogue_export_reads_back_as_import() {
        let rows = vec![CatalogueRow {
            brand: "Dell",
            code: "DL-001",
            description: "Laptop Dell Latitude 5420",
            quantity: 10,
            minimum: 5,
            location: "ALMACÉN",
            serial: "SN12345",
            cost_price: 850.5,
            distributor_price: 900.0,
            integrator_price: 950.0,
            list_price: 1000.0,
        }];
        let csv = ReportingService::export_to_csv(&rows).unwrap();
        assert!(csv.starts_with(
            "MARCA;CODIGO;DESCRIPCION;CANTIDAD;MINIMO;UBICACION;SERIAL;PRECIO_COSTO;PRECIO_DIST;PRECIO_INT;PRECIO_GENERAL\n"
        ));

        let inputs = parse_import(csv.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].brand, "Dell");
        assert_eq!(inputs[0].minimum, 5);
        assert_eq!(inputs[0].serial, "SN12345");
        assert_eq!(inputs[0].cost_price, 850.5);
        assert_eq!(inputs[0].list_price, 1000.0);
    }
}
