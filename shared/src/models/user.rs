//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User account, without credentials
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub active: bool,
    /// Set for seeded accounts until the first password change
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}
