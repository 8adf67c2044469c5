//! Error handling for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::rental::errors::{BookingError, SettlementError, StoreError};
use crate::rental::responses::ErrorResponse;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl AppError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Settlement(err) => match err {
                SettlementError::BookingNotFound(_) => (StatusCode::NOT_FOUND, "booking_not_found"),
                SettlementError::PlanNotFound(_) => (StatusCode::NOT_FOUND, "plan_not_found"),
                SettlementError::AlreadyClosed { .. } => (StatusCode::CONFLICT, "already_closed"),
                SettlementError::InvalidReturnDate { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_return_date")
                }
                SettlementError::Store(store) => store_status(store),
            },
            AppError::Booking(err) => match err {
                BookingError::PlanNotFound(_) => (StatusCode::NOT_FOUND, "plan_not_found"),
                BookingError::PlanInactive(_) => (StatusCode::UNPROCESSABLE_ENTITY, "plan_inactive"),
                BookingError::InvalidPlan(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_plan"),
                BookingError::InvalidStartDate { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_start_date")
                }
                BookingError::Store(store) => store_status(store),
            },
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Settlement(SettlementError::AlreadyClosed {
                booking_id,
                total_charged,
            }) => Some(serde_json::json!({
                "booking_id": booking_id,
                "total_charged": total_charged.map(|t| t.to_string()),
            })),
            _ => None,
        }
    }
}

fn store_status(err: &StoreError) -> (StatusCode, &'static str) {
    match err {
        StoreError::DuplicateBooking(_) => (StatusCode::CONFLICT, "duplicate_booking"),
        StoreError::Database(_) | StoreError::Corrupt(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        // Storage failures are logged, not echoed to the caller
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Storage error: {}", self);
            "Storage error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
