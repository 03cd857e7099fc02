use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::Serialize;

/// Field-keyed validation errors, with nested per-line errors for document
/// items. Serializes to `{"code": "...", "items": [{"item_id": "..."}, {}]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    items: Vec<ValidationErrors>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for a field. A later message for the same field
    /// replaces the earlier one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    /// Attaches per-line errors under `items`. Dropped when no line actually
    /// carries an error.
    pub fn set_items(&mut self, lines: Vec<ValidationErrors>) {
        if lines.iter().any(|line| !line.is_empty()) {
            self.items = lines;
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn items(&self) -> &[ValidationErrors] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.items.iter().all(ValidationErrors::is_empty)
    }

    /// Finishes a validation pass: rejects with the collected errors, or
    /// passes the data through untouched.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationFailed(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("data does not pass validation")]
    ValidationFailed(ValidationErrors),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationFailed(_) | Self::InvalidOperation(_) | Self::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::EventError(_) | Self::Internal(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::Database(_) => "Database error".to_string(),
            Self::EventError(_) | Self::Internal(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ValidationFailed(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}

/// Standardized JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Structured error details (field-keyed validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_pass_through() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn field_errors_reject() {
        let mut errors = ValidationErrors::new();
        errors.add("code", "code is required");
        assert_eq!(errors.field("code"), Some("code is required"));
        assert!(matches!(
            errors.into_result(),
            Err(ServiceError::ValidationFailed(_))
        ));
    }

    #[test]
    fn line_errors_only_attach_when_present() {
        let mut errors = ValidationErrors::new();
        errors.set_items(vec![ValidationErrors::new(), ValidationErrors::new()]);
        assert!(errors.is_empty());

        let mut line = ValidationErrors::new();
        line.add("item_id", "item_id is required");
        errors.set_items(vec![ValidationErrors::new(), line]);
        assert!(!errors.is_empty());
        assert_eq!(errors.items().len(), 2);
    }

    #[test]
    fn serializes_flattened_with_nested_items() {
        let mut line = ValidationErrors::new();
        line.add("quantity", "quantity must be greater than zero");
        let mut errors = ValidationErrors::new();
        errors.add("code", "code already exists");
        errors.set_items(vec![ValidationErrors::new(), line]);

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["code"], "code already exists");
        assert_eq!(value["items"][0], serde_json::json!({}));
        assert_eq!(
            value["items"][1]["quantity"],
            "quantity must be greater than zero"
        );
    }
}
