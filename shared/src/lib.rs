//! Shared types and models for the Stockroom inventory platform
//!
//! Domain models, request inputs and the pure rules (quantity validation,
//! project naming, low-stock evaluation, item search) used by the backend.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
