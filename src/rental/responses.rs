//! Response DTOs for rental API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::models::{Booking, BookingStatus, RentalPlan, ReturnKind, SettlementBreakdown};

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Response for a settlement or its preview
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub booking_id: Uuid,
    pub plan_id: Uuid,
    pub return_kind: ReturnKind,
    pub actual_return_date: DateTime<Utc>,
    pub base_amount: MoneyResponse,
    pub adjustment_amount: MoneyResponse,
    pub total_amount: MoneyResponse,
    pub refund_amount: MoneyResponse,
    pub penalty_retained: MoneyResponse,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub days_overdue: i64,
    pub dry_run: bool,
}

impl From<SettlementBreakdown> for SettlementResponse {
    fn from(b: SettlementBreakdown) -> Self {
        let currency = b.currency.as_str();
        Self {
            booking_id: b.booking_id,
            plan_id: b.plan_id,
            return_kind: b.return_kind,
            actual_return_date: b.actual_return_date,
            base_amount: MoneyResponse::new(b.base_amount, currency),
            adjustment_amount: MoneyResponse::new(b.adjustment_amount, currency),
            total_amount: MoneyResponse::new(b.total_amount, currency),
            refund_amount: MoneyResponse::new(b.refund_amount, currency),
            penalty_retained: MoneyResponse::new(b.penalty_retained, currency),
            days_elapsed: b.days_elapsed,
            days_remaining: b.days_remaining,
            days_overdue: b.days_overdue,
            dry_run: b.dry_run,
        }
    }
}

/// Response for a booking
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub motorcycle_id: Uuid,
    pub renter_id: Uuid,
    pub plan_id: Uuid,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub daily_rate: MoneyResponse,
    pub status: BookingStatus,
    pub actual_return_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_charged: Option<MoneyResponse>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        let currency = b.terms.currency.as_str();
        Self {
            id: b.id,
            motorcycle_id: b.motorcycle_id,
            renter_id: b.renter_id,
            plan_id: b.plan_id,
            planned_start_date: b.planned_start_date,
            planned_end_date: b.planned_end_date,
            daily_rate: MoneyResponse::new(b.terms.daily_rate, currency),
            status: b.status,
            actual_return_date: b.actual_return_date,
            total_charged: b.total_charged.map(|t| MoneyResponse::new(t, currency)),
        }
    }
}

/// Response for a plan
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub duration_in_days: i32,
    pub daily_rate: MoneyResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub early_return_penalty_rate: Decimal,
    pub late_return_daily_surcharge: MoneyResponse,
    pub is_active: bool,
}

impl From<RentalPlan> for PlanResponse {
    fn from(p: RentalPlan) -> Self {
        Self {
            daily_rate: MoneyResponse::new(p.daily_rate, &p.currency),
            late_return_daily_surcharge: MoneyResponse::new(
                p.late_return_daily_surcharge,
                &p.currency,
            ),
            id: p.id,
            name: p.name,
            duration_in_days: p.duration_in_days,
            early_return_penalty_rate: p.early_return_penalty_rate,
            is_active: p.is_active,
        }
    }
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
