//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::models::Item;
use crate::validation::fold_for_search;

/// Low-stock notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub item_id: i64,
    pub code: String,
    pub description: String,
    pub quantity: i64,
    pub minimum: i64,
}

/// Item list filter, as sent by the listing screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Substring of the storage location
    pub location: Option<String>,
    /// Substring of code, description or brand
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
}

impl ItemFilter {
    /// Case- and accent-insensitive match
    pub fn matches(&self, item: &Item) -> bool {
        if self.low_stock_only && !item.is_low_stock() {
            return false;
        }

        if let Some(location) = non_blank(&self.location) {
            if !fold_for_search(&item.location).contains(&fold_for_search(location)) {
                return false;
            }
        }

        if let Some(search) = non_blank(&self.search) {
            let needle = fold_for_search(search);
            let hit = [&item.code, &item.description, &item.brand]
                .iter()
                .any(|field| fold_for_search(field).contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Aggregate counts for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: i64,
    pub low_stock_items: i64,
    pub total_units: i64,
    pub active_projects: i64,
    pub allocated_units: i64,
}
