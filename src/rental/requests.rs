//! Request DTOs for rental API endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::bookings::NewBooking;

/// Request to open a booking
#[derive(Debug, Deserialize)]
pub struct OpenBookingRequest {
    pub motorcycle_id: Uuid,
    pub renter_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default)]
    pub planned_start_date: Option<DateTime<Utc>>,
}

impl From<OpenBookingRequest> for NewBooking {
    fn from(req: OpenBookingRequest) -> Self {
        NewBooking {
            motorcycle_id: req.motorcycle_id,
            renter_id: req.renter_id,
            plan_id: req.plan_id,
            planned_start_date: req.planned_start_date,
        }
    }
}

/// Request to settle and close a booking
#[derive(Debug, Default, Deserialize)]
pub struct SettleBookingRequest {
    #[serde(default)]
    pub actual_return_date: Option<DateTime<Utc>>,
}

/// Query string for a settlement preview
#[derive(Debug, Default, Deserialize)]
pub struct SimulateQuery {
    #[serde(default)]
    pub return_at: Option<DateTime<Utc>>,
}
