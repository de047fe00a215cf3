//! Validation utilities for the Stockroom inventory platform

use validator::ValidationError;

// ============================================================================
// Ledger Rules
// ============================================================================

/// Movement and allocation quantities must be strictly positive
pub fn validate_movement_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Stock levels and minimums may be zero but never negative
pub fn validate_stock_level(value: i64) -> Result<(), &'static str> {
    if value < 0 {
        return Err("Stock levels cannot be negative");
    }
    Ok(())
}

/// An item is low on stock once its quantity is at or below its minimum
pub fn is_low_stock(quantity: i64, minimum: i64) -> bool {
    quantity <= minimum
}

// ============================================================================
// Location Rules
// ============================================================================

/// Trim and upper-case a project name
pub fn normalize_project_name(name: &str) -> Result<String, &'static str> {
    let normalized = name.trim().to_uppercase();
    if normalized.is_empty() {
        return Err("Project name is required");
    }
    if normalized.chars().count() > 120 {
        return Err("Project name must be at most 120 characters");
    }
    Ok(normalized)
}

// ============================================================================
// General Validations
// ============================================================================

/// `validator` hook rejecting empty or whitespace-only text
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Lower-case and strip Spanish/Portuguese diacritics for search matching
pub fn fold_for_search(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
