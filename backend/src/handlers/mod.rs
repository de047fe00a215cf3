//! HTTP handlers

pub mod auth;
pub mod health;
pub mod items;
pub mod movements;
pub mod projects;
pub mod reporting;

pub use auth::{change_password, login};
pub use health::health_check;
pub use items::{create_item, delete_item, get_item, list_items, update_item, upload_item_image};
pub use movements::{get_item_movements, record_entry, record_exit};
pub use projects::{
    assign_stock, create_project, delete_project, get_location, get_project, list_allocations,
    list_locations, return_allocation, update_project,
};
pub use reporting::{export_items, export_selected_items, get_summary, import_items};
