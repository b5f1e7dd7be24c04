use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the dispatch service
#[derive(Debug, Error)]
pub enum DispatchError {
    // Request validation
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    // Lookups
    #[error("Booking not found: {0}")]
    BookingNotFound(String),
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Trip not found: {0}")]
    TripNotFound(String),

    // Business rules
    #[error("Driver {driver_id} is not available (status {status})")]
    DriverUnavailable { driver_id: String, status: String },
    #[error("Cannot {attempted} while {current}")]
    InvalidTransition { current: String, attempted: String },
    #[error("Invalid booking type: {0}")]
    InvalidBookingType(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    // Concurrency and uniqueness
    #[error("Conflict: {0}")]
    Conflict(String),

    // Infrastructure
    #[error("Store error: {0}")]
    Store(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl DispatchError {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::ValidationFailed(_) => "validation_failed",
            DispatchError::BookingNotFound(_) => "booking_not_found",
            DispatchError::DriverNotFound(_) => "driver_not_found",
            DispatchError::CustomerNotFound(_) => "customer_not_found",
            DispatchError::TripNotFound(_) => "trip_not_found",
            DispatchError::DriverUnavailable { .. } => "driver_unavailable",
            DispatchError::InvalidTransition { .. } => "invalid_transition",
            DispatchError::InvalidBookingType(_) => "invalid_booking_type",
            DispatchError::InvalidPhoneNumber(_) => "invalid_phone_number",
            DispatchError::Conflict(_) => "conflict",
            DispatchError::Store(_) => "store_error",
            DispatchError::Serialization(_) => "serialization_error",
            DispatchError::Configuration(_) => "configuration_error",
            DispatchError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::ValidationFailed(_)
            | DispatchError::InvalidBookingType(_)
            | DispatchError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
            DispatchError::BookingNotFound(_)
            | DispatchError::DriverNotFound(_)
            | DispatchError::CustomerNotFound(_)
            | DispatchError::TripNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::DriverUnavailable { .. }
            | DispatchError::InvalidTransition { .. }
            | DispatchError::Conflict(_) => StatusCode::CONFLICT,
            DispatchError::Store(_)
            | DispatchError::Serialization(_)
            | DispatchError::Configuration(_)
            | DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.code().to_string();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let (message, details) = match self {
            DispatchError::ValidationFailed(errors) => (
                "Validation errors occurred".to_string(),
                serde_json::to_value(&errors).ok(),
            ),
            // Keep store internals out of client responses
            DispatchError::Store(_) | DispatchError::Internal(_) => {
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let error_response = ErrorResponse {
            error,
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type DispatchResult<T> = Result<T, DispatchError>;

impl From<redis::RedisError> for DispatchError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => DispatchError::Store(format!("Redis connection error: {}", err)),
            redis::ErrorKind::AuthenticationFailed => {
                DispatchError::Store("Redis authentication failed".to_string())
            }
            _ => DispatchError::Store(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for DispatchError {
    fn from(err: config::ConfigError) -> Self {
        DispatchError::Configuration(err.to_string())
    }
}

// Helper functions for creating common errors
impl DispatchError {
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn invalid_transition(current: impl ToString, attempted: impl Into<String>) -> Self {
        DispatchError::InvalidTransition {
            current: current.to_string(),
            attempted: attempted.into(),
        }
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        DispatchError::Internal(msg.into())
    }
}

/// Accumulates field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "is required");
        }
        value
    }

    pub fn require_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, "is required");
                None
            }
        }
    }

    pub fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.add(field, "must be a non-negative number");
        }
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn finish(self) -> DispatchResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::ValidationFailed(self.errors))
        }
    }
}
