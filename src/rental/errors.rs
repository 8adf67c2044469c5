//! Error types for the rental domain.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A plan definition that violates its own invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("Plan duration must be at least one day (got {0})")]
    NonPositiveDuration(i32),

    #[error("Plan duration must not exceed {max} days (got {days})")]
    DurationTooLong { days: i32, max: i32 },

    #[error("Daily rate must not be negative (got {0})")]
    NegativeDailyRate(Decimal),

    #[error("Early return penalty rate must be between 0 and 1 (got {0})")]
    PenaltyRateOutOfRange(Decimal),

    #[error("Late return surcharge must not be negative (got {0})")]
    NegativeSurcharge(Decimal),

    #[error("Currency must be a three-letter code (got '{0}')")]
    InvalidCurrency(String),

    #[error("{field} must be a whole number of cents (got {value})")]
    SubCentAmount { field: &'static str, value: Decimal },
}

/// Failure of a plan or booking collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Booking {0} already exists")]
    DuplicateBooking(Uuid),

    #[error("Stored record is unreadable: {0}")]
    Corrupt(String),
}

/// Errors raised while settling or simulating a booking.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("Plan {0} not found")]
    PlanNotFound(Uuid),

    #[error("Booking {booking_id} is already closed")]
    AlreadyClosed {
        booking_id: Uuid,
        total_charged: Option<Decimal>,
    },

    #[error("Return date {actual_return_date} is before the rental start {planned_start_date}")]
    InvalidReturnDate {
        actual_return_date: DateTime<Utc>,
        planned_start_date: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while opening a new booking.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Plan {0} not found")]
    PlanNotFound(Uuid),

    #[error("Plan {0} is inactive and cannot be booked")]
    PlanInactive(Uuid),

    #[error("Invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),

    #[error("Start date {planned_start_date} leaves no room for a {duration_in_days}-day rental")]
    InvalidStartDate {
        planned_start_date: DateTime<Utc>,
        duration_in_days: i32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
