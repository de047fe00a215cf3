//! HTTP handlers for stock entries, exits and history

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{Item, Movement, MovementInput};

use crate::error::AppResult;
use crate::services::LedgerService;
use crate::AppState;

/// Add stock to an item
pub async fn record_entry(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(input): Json<MovementInput>,
) -> AppResult<Json<Item>> {
    let service = LedgerService::new(state.db, state.notifier);
    let item = service.record_entry(item_id, input).await?;
    Ok(Json(item))
}

/// Take stock out of an item
pub async fn record_exit(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(input): Json<MovementInput>,
) -> AppResult<Json<Item>> {
    let service = LedgerService::new(state.db, state.notifier);
    let item = service.record_exit(item_id, input).await?;
    Ok(Json(item))
}

/// Movement history of an item, newest first
pub async fn get_item_movements(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = LedgerService::new(state.db, state.notifier);
    let movements = service.history(item_id).await?;
    Ok(Json(movements))
}
