//! Inventory item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::types::LowStockAlert;
use crate::validation::{is_low_stock, validate_not_blank};

/// A stocked item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub brand: String,
    /// Catalogue code, not enforced unique
    pub code: String,
    pub description: String,
    pub quantity: i64,
    pub minimum: i64,
    /// Free-text storage location
    pub location: String,
    pub serial: String,
    pub cost_price: f64,
    pub distributor_price: f64,
    pub integrator_price: f64,
    pub list_price: f64,
    /// Stored image file name, relative to the upload directory
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.quantity, self.minimum)
    }

    /// Evaluate the item's current state, yielding an alert when it sits at
    /// or below its minimum.
    pub fn low_stock_alert(&self) -> Option<LowStockAlert> {
        self.is_low_stock().then(|| LowStockAlert {
            item_id: self.id,
            code: self.code.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            minimum: self.minimum,
        })
    }
}

/// Input for creating an item
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(custom = "validate_not_blank")]
    pub brand: String,
    #[validate(custom = "validate_not_blank")]
    pub code: String,
    #[validate(custom = "validate_not_blank")]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub minimum: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub distributor_price: f64,
    #[serde(default)]
    pub integrator_price: f64,
    #[serde(default)]
    pub list_price: f64,
}

impl CreateItemInput {
    /// Trim the text fields the way the entry form does
    pub fn normalized(mut self) -> Self {
        self.brand = self.brand.trim().to_string();
        self.code = self.code.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.serial = self.serial.trim().to_string();
        self
    }
}

/// Input for editing an item; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(custom = "validate_not_blank")]
    pub brand: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub code: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub description: Option<String>,
    /// A changed quantity is booked as an adjustment movement
    #[validate(range(min = 0))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0))]
    pub minimum: Option<i64>,
    pub location: Option<String>,
    pub serial: Option<String>,
    pub cost_price: Option<f64>,
    pub distributor_price: Option<f64>,
    pub integrator_price: Option<f64>,
    pub list_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, minimum: i64) -> Item {
        Item {
            id: 7,
            brand: "Cisco".into(),
            code: "CS-007".into(),
            description: "Router Cisco RV340".into(),
            quantity,
            minimum,
            location: "BODEGA".into(),
            serial: "SN55555".into(),
            cost_price: 220.0,
            distributor_price: 250.0,
            integrator_price: 260.0,
            list_price: 280.0,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn alert_raised_at_minimum() {
        let alert = item(2, 2).low_stock_alert().unwrap();
        assert_eq!(alert.item_id, 7);
        assert_eq!(alert.code, "CS-007");
        assert_eq!(alert.quantity, 2);
    }

    #[test]
    fn no_alert_above_minimum() {
        assert!(item(3, 2).low_stock_alert().is_none());
    }

    #[test]
    fn create_input_rejects_blank_code() {
        let input = CreateItemInput {
            brand: "Dell".into(),
            code: "   ".into(),
            description: "Laptop".into(),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }

    #[test]
    fn create_input_rejects_negative_minimum() {
        let input = CreateItemInput {
            brand: "Dell".into(),
            code: "DL-001".into(),
            description: "Laptop".into(),
            minimum: -1,
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_input_allows_absent_fields() {
        assert!(UpdateItemInput::default().validate().is_ok());
    }
}
