//! HTTP handlers for item endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{CreateItemInput, Item, ItemFilter, UpdateItemInput};

use crate::error::{AppError, AppResult};
use crate::services::{ItemList, ItemService};
use crate::AppState;

fn item_service(state: AppState) -> ItemService {
    ItemService::new(state.db, state.notifier, &state.config.uploads.dir)
}

/// List items matching the query filter
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> AppResult<Json<ItemList>> {
    let items = item_service(state).list(&filter).await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = item_service(state).create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Item>> {
    let item = item_service(state).get(item_id).await?;
    Ok(Json(item))
}

/// Edit an item
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let item = item_service(state).update(item_id, input).await?;
    Ok(Json(item))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<StatusCode> {
    item_service(state).delete(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an item image from the `image` multipart field
pub async fn upload_item_image(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<Item>> {
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_upload)?;

        let item = item_service(state)
            .set_image(item_id, &file_name, &bytes)
            .await?;
        return Ok(Json(item));
    }

    Err(AppError::validation(
        "image",
        "No image was uploaded",
        "No se subió ninguna imagen",
    ))
}

pub(crate) fn bad_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(
        "file",
        &format!("Malformed upload: {}", e),
        "Archivo subido con formato inválido",
    )
}
