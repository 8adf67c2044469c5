//! Core settlement calculation functions.
//!
//! Pure functions for settlement math - no database access, no clock.
//! Every amount is rounded to cents with banker's rounding.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use super::errors::SettlementError;
use super::models::{Booking, ReturnKind, SettlementBreakdown};

/// Decimal places kept on every money amount
pub const MONEY_PLACES: u32 = 2;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use motorent::rental::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Whole days in a non-negative span, counting any started day as a full one.
pub fn whole_days_ceil(span: Duration) -> i64 {
    let days = span.num_days();
    if span > Duration::days(days) {
        days + 1
    } else {
        days
    }
}

/// Whole days in a non-negative span, ignoring a trailing partial day.
pub fn whole_days_floor(span: Duration) -> i64 {
    span.num_days()
}

/// Position of a return relative to the planned end date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnTiming {
    OnTime,
    Early { days_remaining: i64 },
    Late { days_overdue: i64 },
}

impl ReturnTiming {
    pub fn kind(&self) -> ReturnKind {
        match self {
            ReturnTiming::OnTime => ReturnKind::OnTime,
            ReturnTiming::Early { .. } => ReturnKind::Early,
            ReturnTiming::Late { .. } => ReturnKind::Late,
        }
    }
}

/// Classify a return against the planned end date.
///
/// Late as soon as the end date has passed; early only when at least one full
/// committed day is left unused. A return inside the final day is on time.
pub fn classify_return(
    planned_end_date: DateTime<Utc>,
    actual_return_date: DateTime<Utc>,
) -> ReturnTiming {
    if actual_return_date > planned_end_date {
        return ReturnTiming::Late {
            days_overdue: whole_days_ceil(actual_return_date - planned_end_date),
        };
    }

    let days_remaining = whole_days_floor(planned_end_date - actual_return_date);
    if days_remaining > 0 {
        ReturnTiming::Early { days_remaining }
    } else {
        ReturnTiming::OnTime
    }
}

/// Compute the settlement of `booking` if returned at `actual_return_date`.
///
/// Prices from the plan terms stored on the booking. Closed bookings and
/// returns before the planned start are rejected. The result is identical for
/// identical inputs; `dry_run` is only recorded on the breakdown.
pub fn calculate_settlement(
    booking: &Booking,
    actual_return_date: DateTime<Utc>,
    dry_run: bool,
) -> Result<SettlementBreakdown, SettlementError> {
    if booking.is_closed() {
        return Err(SettlementError::AlreadyClosed {
            booking_id: booking.id,
            total_charged: booking.total_charged,
        });
    }
    if actual_return_date < booking.planned_start_date {
        return Err(SettlementError::InvalidReturnDate {
            actual_return_date,
            planned_start_date: booking.planned_start_date,
        });
    }

    let terms = &booking.terms;
    let days_elapsed = whole_days_ceil(actual_return_date - booking.planned_start_date);

    // The full committed price is the floor of every settlement
    let base_amount = round_money(
        terms.daily_rate * Decimal::from(terms.duration_in_days),
        MONEY_PLACES,
    );

    let timing = classify_return(booking.planned_end_date, actual_return_date);

    let (adjustment_amount, refund_amount, penalty_retained, days_remaining, days_overdue) =
        match timing {
            ReturnTiming::OnTime => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 0, 0),
            ReturnTiming::Early { days_remaining } => {
                let unused_value = round_money(
                    terms.daily_rate * Decimal::from(days_remaining),
                    MONEY_PLACES,
                );
                let refund = round_money(
                    unused_value * (Decimal::ONE - terms.early_return_penalty_rate),
                    MONEY_PLACES,
                );
                (-refund, refund, unused_value - refund, days_remaining, 0)
            }
            ReturnTiming::Late { days_overdue } => {
                let surcharge = round_money(
                    terms.late_return_daily_surcharge * Decimal::from(days_overdue),
                    MONEY_PLACES,
                );
                (surcharge, Decimal::ZERO, Decimal::ZERO, 0, days_overdue)
            }
        };

    // Misconfigured negative rates must never produce a credit
    let total_amount = (base_amount + adjustment_amount).max(Decimal::ZERO);

    Ok(SettlementBreakdown {
        booking_id: booking.id,
        plan_id: booking.plan_id,
        return_kind: timing.kind(),
        actual_return_date,
        base_amount,
        adjustment_amount,
        total_amount,
        refund_amount,
        penalty_retained,
        days_elapsed,
        days_remaining,
        days_overdue,
        currency: terms.currency.clone(),
        dry_run,
    })
}
