//! Error types for the ride core and its HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::{RideId, RideStatus};

/// Failures reported by the ride ledger and the account book.
///
/// Every failing operation leaves state exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("qr code does not unlock scooter {scooter_id}")]
    InvalidCode { scooter_id: String },

    #[error("scooter {scooter_id} is not available")]
    Unavailable { scooter_id: String },

    #[error("cannot {action} ride {ride_id} while it is {from}")]
    InvalidTransition {
        ride_id: RideId,
        from: RideStatus,
        action: &'static str,
    },

    #[error("ride {ride_id} cannot end before it started")]
    InvalidTime { ride_id: RideId },

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("invalid scooter: {0}")]
    InvalidScooter(String),

    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    #[error("current location is unavailable")]
    LocationUnavailable,
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::InvalidCode { .. } => "INVALID_CODE",
            LedgerError::Unavailable { .. } => "UNAVAILABLE",
            LedgerError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LedgerError::InvalidTime { .. } => "INVALID_TIME",
            LedgerError::Duplicate(_) => "DUPLICATE",
            LedgerError::InvalidScooter(_) => "INVALID_SCOOTER",
            LedgerError::PaymentDeclined(_) => "PAYMENT_DECLINED",
            LedgerError::LocationUnavailable => "LOCATION_UNAVAILABLE",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Ledger(e) => e.code(),
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e {
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InvalidCode { .. } => StatusCode::FORBIDDEN,
                LedgerError::Unavailable { .. }
                | LedgerError::InvalidTransition { .. }
                | LedgerError::Duplicate(_) => StatusCode::CONFLICT,
                LedgerError::InvalidTime { .. } | LedgerError::InvalidScooter(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LedgerError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
                LedgerError::LocationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, code = %code, "Request failed");
        } else {
            tracing::debug!(error = %message, code = %code, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
