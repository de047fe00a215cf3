//! HTTP handlers for locations, projects and allocations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{
    Allocation, AssignInput, CreateProjectInput, Location, LocationKind, ProjectAllocation,
    ReturnInput, ReturnOutcome, UpdateProjectInput,
};

use crate::error::AppResult;
use crate::services::{AllocationService, LocationService, ProjectDeletion};
use crate::AppState;

/// Query parameters for listing locations
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub kind: Option<LocationKind>,
}

/// List locations, optionally only fixed ones or only projects
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<Location>>> {
    let service = LocationService::new(state.db);
    let locations = service.list(query.kind).await?;
    Ok(Json(locations))
}

/// Get a location by ID
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let location = service.get(location_id).await?;
    Ok(Json(location))
}

/// Create a project
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<(StatusCode, Json<Location>)> {
    let service = LocationService::new(state.db);
    let project = service.create_project(input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Get a project
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let project = service.get_project(project_id).await?;
    Ok(Json(project))
}

/// Edit project metadata
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let project = service.update_project(project_id, input).await?;
    Ok(Json(project))
}

/// Delete a project, returning its allocated stock
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> AppResult<Json<ProjectDeletion>> {
    let service = AllocationService::new(state.db, state.notifier);
    let deletion = service.delete_project(project_id).await?;
    Ok(Json(deletion))
}

/// Allocations of a project
pub async fn list_allocations(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> AppResult<Json<Vec<ProjectAllocation>>> {
    let service = AllocationService::new(state.db, state.notifier);
    let allocations = service.list_for_project(project_id).await?;
    Ok(Json(allocations))
}

/// Assign stock to a project
pub async fn assign_stock(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(input): Json<AssignInput>,
) -> AppResult<(StatusCode, Json<Allocation>)> {
    let service = AllocationService::new(state.db, state.notifier);
    let allocation = service.assign(project_id, input).await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

/// Return stock from an allocation
pub async fn return_allocation(
    State(state): State<AppState>,
    Path(allocation_id): Path<i64>,
    Json(input): Json<ReturnInput>,
) -> AppResult<Json<ReturnOutcome>> {
    let service = AllocationService::new(state.db, state.notifier);
    let outcome = service.return_partial(allocation_id, input.quantity).await?;
    Ok(Json(outcome))
}
