//! Route definitions for the Stockroom API

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use tower_http::services::ServeDir;

use crate::{handlers, middleware::auth_middleware, AppState};

/// Upload limit for item images and CSV imports
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes
        .nest("/items", item_routes(state.clone()))
        .nest("/projects", project_routes(state.clone()))
        .merge(misc_routes(state))
}

/// Authentication routes; only login is public
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/password", post(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// Item, ledger and CSV routes (protected)
fn item_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/export", get(handlers::export_items))
        .route("/export/selected", post(handlers::export_selected_items))
        .route(
            "/import",
            post(handlers::import_items).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/:item_id/image",
            put(handlers::upload_item_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/:item_id/movements", get(handlers::get_item_movements))
        .route("/:item_id/entries", post(handlers::record_entry))
        .route("/:item_id/exits", post(handlers::record_exit))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Project and allocation routes (protected)
fn project_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_project))
        .route(
            "/:project_id",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/:project_id/allocations",
            get(handlers::list_allocations).post(handlers::assign_stock),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Locations, returns and reports (protected)
fn misc_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/locations", get(handlers::list_locations))
        .route("/locations/:location_id", get(handlers::get_location))
        .route(
            "/allocations/:allocation_id/return",
            post(handlers::return_allocation),
        )
        .route("/reports/summary", get(handlers::get_summary))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Stored item images (protected)
pub fn upload_routes(state: AppState) -> Router<AppState> {
    let uploads = ServeDir::new(&state.config.uploads.dir);

    Router::new()
        .nest_service("/uploads", uploads)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
