//! Business logic services for the Stockroom inventory platform

pub mod allocation;
pub mod auth;
pub mod items;
pub mod ledger;
pub mod locations;
pub mod notification;
pub mod reporting;

pub use allocation::{AllocationService, ProjectDeletion};
pub use auth::AuthService;
pub use items::{ItemList, ItemService};
pub use ledger::LedgerService;
pub use locations::LocationService;
pub use notification::{LogNotifier, LowStockNotifier, WebhookNotifier};
pub use reporting::ReportingService;
