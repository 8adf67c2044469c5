//! Domain models for rental plans, bookings and settlements.
//!
//! `RentalPlan` derives sqlx's FromRow for direct database deserialization.
//! Bookings are stored flattened (see `queries::BookingRow`).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::calculators::MONEY_PLACES;
use super::errors::{BookingError, PlanError};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Longest rental a plan may commit to
pub const MAX_DURATION_DAYS: i32 = 3650;

/// Pricing terms of a plan, snapshotted onto every booking at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTerms {
    pub duration_in_days: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub daily_rate: Decimal,
    /// Fraction of the unused days' value kept as a penalty on early return
    #[serde(with = "rust_decimal::serde::str")]
    pub early_return_penalty_rate: Decimal,
    /// Flat amount charged per overdue day, independent of `daily_rate`
    #[serde(with = "rust_decimal::serde::str")]
    pub late_return_daily_surcharge: Decimal,
    pub currency: String,
}

impl PlanTerms {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.duration_in_days <= 0 {
            return Err(PlanError::NonPositiveDuration(self.duration_in_days));
        }
        if self.duration_in_days > MAX_DURATION_DAYS {
            return Err(PlanError::DurationTooLong {
                days: self.duration_in_days,
                max: MAX_DURATION_DAYS,
            });
        }
        if self.daily_rate < Decimal::ZERO {
            return Err(PlanError::NegativeDailyRate(self.daily_rate));
        }
        if self.early_return_penalty_rate < Decimal::ZERO
            || self.early_return_penalty_rate > Decimal::ONE
        {
            return Err(PlanError::PenaltyRateOutOfRange(
                self.early_return_penalty_rate,
            ));
        }
        if self.late_return_daily_surcharge < Decimal::ZERO {
            return Err(PlanError::NegativeSurcharge(self.late_return_daily_surcharge));
        }
        // Money inputs are cents so every product with a day count stays exact
        for (field, value) in [
            ("daily_rate", self.daily_rate),
            ("late_return_daily_surcharge", self.late_return_daily_surcharge),
        ] {
            if value.normalize().scale() > MONEY_PLACES {
                return Err(PlanError::SubCentAmount { field, value });
            }
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(PlanError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }

    /// The committed length of the rental as a chrono duration
    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.duration_in_days))
    }
}

/// Rental plan from rental_plans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RentalPlan {
    pub id: Uuid,
    pub name: String,
    pub duration_in_days: i32,
    pub daily_rate: Decimal,
    pub early_return_penalty_rate: Decimal,
    pub late_return_daily_surcharge: Decimal,
    pub currency: String,
    pub is_active: bool,
}

impl RentalPlan {
    /// Create a new active plan, rejecting terms that break plan invariants.
    pub fn new(name: impl Into<String>, terms: PlanTerms) -> Result<Self, PlanError> {
        terms.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration_in_days: terms.duration_in_days,
            daily_rate: terms.daily_rate,
            early_return_penalty_rate: terms.early_return_penalty_rate,
            late_return_daily_surcharge: terms.late_return_daily_surcharge,
            currency: terms.currency,
            is_active: true,
        })
    }

    pub fn terms(&self) -> PlanTerms {
        PlanTerms {
            duration_in_days: self.duration_in_days,
            daily_rate: self.daily_rate,
            early_return_penalty_rate: self.early_return_penalty_rate,
            late_return_daily_surcharge: self.late_return_daily_surcharge,
            currency: self.currency.clone(),
        }
    }

    /// Retire the plan. Existing bookings keep settling against it.
    pub fn deactivate(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Open,
    Closed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Open => "open",
            BookingStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(BookingStatus::Open),
            "closed" => Some(BookingStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields written when a booking is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingClosure {
    pub actual_return_date: DateTime<Utc>,
    pub total_charged: Decimal,
}

/// A single rental agreement.
///
/// Everything except `status`, `actual_return_date`, `total_charged` and
/// `version` is fixed at creation. `version` increases on every write and
/// guards the Open -> Closed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub motorcycle_id: Uuid,
    pub renter_id: Uuid,
    pub plan_id: Uuid,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub terms: PlanTerms,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub total_charged: Option<Decimal>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Open a booking against an active plan.
    ///
    /// The planned end date is derived from the plan duration and stored with
    /// a copy of the plan terms, so later plan edits do not reprice it.
    pub fn open(
        plan: &RentalPlan,
        motorcycle_id: Uuid,
        renter_id: Uuid,
        planned_start_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, BookingError> {
        if !plan.is_active {
            return Err(BookingError::PlanInactive(plan.id));
        }
        let terms = plan.terms();
        terms.validate()?;
        let planned_end_date = planned_start_date
            .checked_add_signed(terms.duration())
            .ok_or(BookingError::InvalidStartDate {
                planned_start_date,
                duration_in_days: terms.duration_in_days,
            })?;

        Ok(Self {
            id: Uuid::new_v4(),
            motorcycle_id,
            renter_id,
            plan_id: plan.id,
            planned_start_date,
            planned_end_date,
            terms,
            actual_return_date: None,
            status: BookingStatus::Open,
            total_charged: None,
            version: 0,
            created_at,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == BookingStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == BookingStatus::Closed
    }

    /// Apply a settlement if the booking is still open at `expected_version`.
    ///
    /// Returns false and leaves the booking untouched otherwise.
    pub fn close_if_current(&mut self, expected_version: i64, closure: &BookingClosure) -> bool {
        if !self.is_open() || self.version != expected_version {
            return false;
        }
        self.status = BookingStatus::Closed;
        self.actual_return_date = Some(closure.actual_return_date);
        self.total_charged = Some(closure.total_charged);
        self.version += 1;
        true
    }
}

/// How a return relates to the planned end date, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    OnTime,
    Early,
    Late,
}

/// Itemized cost of returning a booking at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementBreakdown {
    pub booking_id: Uuid,
    pub plan_id: Uuid,
    pub return_kind: ReturnKind,
    pub actual_return_date: DateTime<Utc>,
    pub base_amount: Decimal,
    pub adjustment_amount: Decimal,
    pub total_amount: Decimal,
    /// Early returns only: value of unused days handed back
    pub refund_amount: Decimal,
    /// Early returns only: value of unused days kept as penalty
    pub penalty_retained: Decimal,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub days_overdue: i64,
    pub currency: String,
    pub dry_run: bool,
}

impl SettlementBreakdown {
    pub fn closure(&self) -> BookingClosure {
        BookingClosure {
            actual_return_date: self.actual_return_date,
            total_charged: self.total_amount,
        }
    }
}
