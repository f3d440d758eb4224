//! Response types for the pay ledger API.
//!
//! This module defines the error response structures and the mapping from
//! [`LedgerError`] to HTTP status codes.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::calculation::Violation;
use crate::error::LedgerError;
use crate::models::WeekInvoice;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Every projected total that would have gone negative.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Violation>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            conflicts: Vec::new(),
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(code, message)
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates a missing tenant error response.
    pub fn missing_tenant() -> Self {
        Self::with_details(
            "MISSING_TENANT",
            "missing tenant",
            "Every request must carry an 'x-tenant-id' header",
        )
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiErrorResponse {
    fn from(error: LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::NotFound { entity, id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::with_details(
                    "NOT_FOUND",
                    message,
                    format!("No {} exists for '{}'", entity, id),
                ),
            },
            LedgerError::DuplicateRecord { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("DUPLICATE_RECORD", message),
            },
            LedgerError::ConcurrentModification { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "CONCURRENT_MODIFICATION",
                    message,
                    "The record changed while the request was processed; retry it",
                ),
            },
            LedgerError::NegativeTotal { violation } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError {
                    conflicts: vec![violation],
                    ..ApiError::new("NEGATIVE_TOTAL", message)
                },
            },
            LedgerError::PartialBatchConflict { conflicts } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError {
                    conflicts,
                    ..ApiError::new("PARTIAL_BATCH_CONFLICT", message)
                },
            },
            LedgerError::InvalidInput { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("VALIDATION_ERROR", message),
            },
            LedgerError::Storage { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("STORAGE_ERROR", "Storage failure", message),
            },
            LedgerError::ConfigNotFound { .. } | LedgerError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
        }
    }
}

/// Body of `GET /week-invoices/:worker_id/:service_week`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekInvoiceResponse {
    /// Currency of every amount in the invoice.
    pub currency: String,
    /// The invoice.
    #[serde(flatten)]
    pub invoice: WeekInvoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
        assert!(!json.contains("conflicts"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response: ApiErrorResponse = LedgerError::NotFound {
            entity: EntityKind::WeekInvoice,
            id: "w-1@2024-W23".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.code, "NOT_FOUND");
    }

    #[test]
    fn test_batch_conflict_lists_every_violation() {
        let conflicts = vec![
            Violation::new(EntityKind::DayRecord, Uuid::new_v4(), dec!(-5)),
            Violation::new(EntityKind::WeekInvoice, Uuid::new_v4(), dec!(-5)),
        ];
        let response: ApiErrorResponse = LedgerError::PartialBatchConflict {
            conflicts: conflicts.clone(),
        }
        .into();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.conflicts, conflicts);
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let duplicate: ApiErrorResponse = LedgerError::DuplicateRecord {
            entity: EntityKind::DayRecord,
            key: "w-1@2024-06-03".to_string(),
        }
        .into();
        assert_eq!(duplicate.status, StatusCode::CONFLICT);

        let concurrent: ApiErrorResponse = LedgerError::ConcurrentModification {
            entity: EntityKind::WeekInvoice,
            id: Uuid::new_v4().to_string(),
        }
        .into();
        assert_eq!(concurrent.status, StatusCode::CONFLICT);
        assert_eq!(concurrent.error.code, "CONCURRENT_MODIFICATION");
    }
}
