//! Error handling for the Stockroom server
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_es: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    // Ledger errors
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_es: String,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Validation failure on a single field
    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Unauthorized { .. } => "UNAUTHORIZED",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateName(_) => "DUPLICATE_NAME",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: format!("Invalid value for {}", field),
            message_es: format!("Valor inválido para {}", field),
            field,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();
        let (status, message_en, message_es, field) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
                "Usuario o contraseña incorrectos".to_string(),
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid token".to_string(),
                "Token inválido".to_string(),
                None,
            ),
            AppError::Unauthorized { message, message_es } => (
                StatusCode::UNAUTHORIZED,
                message.clone(),
                message_es.clone(),
                None,
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                message.clone(),
                message_es.clone(),
                Some(field.clone()),
            ),
            AppError::InvalidQuantity(msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                format!("Cantidad inválida: {}", msg),
                Some("quantity".to_string()),
            ),
            AppError::InsufficientStock {
                requested,
                available,
                ..
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Insufficient stock: requested {}, available {}",
                    requested, available
                ),
                format!(
                    "Stock insuficiente: solicitado {}, disponible {}",
                    requested, available
                ),
                Some("quantity".to_string()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("{} not found", resource),
                format!("No se encontró {}", resource),
                None,
            ),
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                format!("A location named {} already exists", name),
                format!("Ya existe una ubicación llamada {}", name),
                Some("name".to_string()),
            ),
            AppError::Conflict {
                resource,
                message,
                message_es,
            } => (
                StatusCode::CONFLICT,
                message.clone(),
                message_es.clone(),
                Some(resource.clone()),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "A database error occurred".to_string(),
                "Ocurrió un error en la base de datos".to_string(),
                None,
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
                "Error interno del servidor".to_string(),
                None,
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
                "Error interno del servidor".to_string(),
                None,
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message_en,
                message_es,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_client_statuses() {
        let cases = [
            (AppError::InvalidQuantity("zero".into()), StatusCode::BAD_REQUEST),
            (
                AppError::InsufficientStock {
                    item_id: 1,
                    requested: 5,
                    available: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound("Item".into()), StatusCode::NOT_FOUND),
            (AppError::DuplicateName("SITE-1".into()), StatusCode::CONFLICT),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AppError::DuplicateName("X".into()).code(), "DUPLICATE_NAME");
        assert_eq!(AppError::InvalidQuantity("x".into()).code(), "INVALID_QUANTITY");
    }
}
