//! Stock movement ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Direction of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
}

/// A ledger row, joined with the current name of its project
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movement {
    pub id: i64,
    pub item_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub note: Option<String>,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for an entry or exit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementInput {
    pub quantity: i64,
    pub note: Option<String>,
    /// Project the stock comes from or goes to
    pub project_id: Option<i64>,
}

