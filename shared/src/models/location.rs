//! Storage locations and project pseudo-locations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// Seeded storage place (warehouse, shelf)
    Fixed,
    /// Job site stock can be checked out to
    Project,
}

/// A location row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    /// Upper-case, unique across every kind
    pub name: String,
    pub kind: LocationKind,
    pub active: bool,
    pub description: Option<String>,
    /// Requesting client of a project
    pub client: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub client: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Metadata edits for a project; the name is fixed once created
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectInput {
    pub description: Option<String>,
    pub client: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub active: Option<bool>,
}
