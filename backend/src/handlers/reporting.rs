//! HTTP handlers for the dashboard summary and CSV import/export

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{InventorySummary, ItemFilter};

use crate::error::{AppError, AppResult};
use crate::handlers::items::bad_upload;
use crate::services::ReportingService;
use crate::AppState;

fn reporting_service(state: AppState) -> ReportingService {
    ReportingService::new(state.db, state.notifier, &state.config.uploads.dir)
}

/// Items chosen for export
#[derive(Debug, Deserialize)]
pub struct SelectedItems {
    pub ids: Vec<i64>,
}

/// Import options
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub replace: bool,
}

/// Import result
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// Dashboard counters
pub async fn get_summary(State(state): State<AppState>) -> AppResult<Json<InventorySummary>> {
    let service = reporting_service(state);
    let summary = service.summary().await?;
    Ok(Json(summary))
}

/// Export the filtered item list as CSV
pub async fn export_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> AppResult<impl IntoResponse> {
    let service = reporting_service(state);
    let csv = service.export_items_csv(&filter).await?;
    Ok(csv_attachment(csv, "inventario.csv"))
}

/// Export selected items as CSV
pub async fn export_selected_items(
    State(state): State<AppState>,
    Json(selection): Json<SelectedItems>,
) -> AppResult<impl IntoResponse> {
    if selection.ids.is_empty() {
        return Err(AppError::validation(
            "ids",
            "Select at least one item",
            "Seleccione al menos un producto",
        ));
    }
    let service = reporting_service(state);
    let csv = service.export_selected_csv(&selection.ids).await?;
    Ok(csv_attachment(csv, "productos_seleccionados.csv"))
}

/// Import items from the `file` multipart field
pub async fn import_items(
    State(state): State<AppState>,
    Query(options): Query<ImportQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        let body = field.bytes().await.map_err(bad_upload)?;

        let service = reporting_service(state);
        let imported = service.import_items_csv(&body, options.replace).await?;
        return Ok(Json(ImportResponse { imported }));
    }

    Err(AppError::validation(
        "file",
        "No file was uploaded",
        "No se subió ningún archivo",
    ))
}

fn csv_attachment(csv: String, file_name: &str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        csv,
    )
}
