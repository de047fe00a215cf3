//! Project allocation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stock currently checked out to a project
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Allocation {
    pub id: i64,
    pub project_id: i64,
    pub item_id: i64,
    /// Always positive; the row is deleted once fully returned
    pub quantity_assigned: i64,
    pub assigned_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Allocation listed under its project, with item details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectAllocation {
    pub id: i64,
    pub project_id: i64,
    pub item_id: i64,
    pub item_code: String,
    pub item_description: String,
    pub quantity_assigned: i64,
    pub assigned_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Input for assigning stock to a project
#[derive(Debug, Clone, Deserialize)]
pub struct AssignInput {
    pub item_id: i64,
    pub quantity: i64,
    pub note: Option<String>,
}

/// Input for returning stock from a project
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnInput {
    pub quantity: i64,
}

/// Outcome of a return
#[derive(Debug, Clone, Serialize)]
pub struct ReturnOutcome {
    /// Remaining allocation, `None` once everything came back
    pub allocation: Option<Allocation>,
    pub item_quantity: i64,
}
