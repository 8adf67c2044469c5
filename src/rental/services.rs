//! Settlement engine over the plan catalog and booking store.
//!
//! Lookups are surfaced immediately on failure; the engine never retries.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calculators::calculate_settlement;
use super::errors::SettlementError;
use super::models::{Booking, RentalPlan, SettlementBreakdown};
use super::store::{BookingStore, Clock, PlanCatalog};

#[derive(Clone)]
pub struct SettlementEngine {
    plans: Arc<dyn PlanCatalog>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl SettlementEngine {
    pub fn new(
        plans: Arc<dyn PlanCatalog>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            plans,
            bookings,
            clock,
        }
    }

    /// Settle a booking at `actual_return_date` (or now).
    ///
    /// With `dry_run` the breakdown is only computed. Otherwise the booking is
    /// closed with a compare-and-set on its status and version; losing that
    /// race is reported as `AlreadyClosed`, exactly like settling a booking
    /// that was closed before the call.
    pub async fn settle(
        &self,
        booking_id: Uuid,
        actual_return_date: Option<DateTime<Utc>>,
        dry_run: bool,
    ) -> Result<SettlementBreakdown, SettlementError> {
        let booking = self.load_booking(booking_id).await?;
        // Only checks the reference; pricing uses the terms stored on the booking
        self.load_plan(booking.plan_id).await?;

        let at = actual_return_date.unwrap_or_else(|| self.clock.now());
        let breakdown = calculate_settlement(&booking, at, dry_run)?;

        if dry_run {
            debug!(
                booking_id = %booking_id,
                total = %breakdown.total_amount,
                "Simulated settlement"
            );
            return Ok(breakdown);
        }

        let committed = self
            .bookings
            .compare_and_close(booking.id, booking.version, &breakdown.closure())
            .await?;

        if !committed {
            warn!(booking_id = %booking_id, "Settlement lost race; booking already closed");
            let total_charged = self
                .bookings
                .get_booking(booking_id)
                .await?
                .and_then(|b| b.total_charged);
            return Err(SettlementError::AlreadyClosed {
                booking_id,
                total_charged,
            });
        }

        info!(
            booking_id = %booking_id,
            kind = ?breakdown.return_kind,
            total = %breakdown.total_amount,
            currency = %breakdown.currency,
            "Booking settled"
        );
        Ok(breakdown)
    }

    /// Finalize a booking: settle and close it
    pub async fn finalize(
        &self,
        booking_id: Uuid,
        actual_return_date: Option<DateTime<Utc>>,
    ) -> Result<SettlementBreakdown, SettlementError> {
        self.settle(booking_id, actual_return_date, false).await
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, SettlementError> {
        self.load_booking(booking_id).await
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> Result<RentalPlan, SettlementError> {
        self.load_plan(plan_id).await
    }

    async fn load_booking(&self, booking_id: Uuid) -> Result<Booking, SettlementError> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or(SettlementError::BookingNotFound(booking_id))
    }

    async fn load_plan(&self, plan_id: Uuid) -> Result<RentalPlan, SettlementError> {
        self.plans
            .get_plan(plan_id)
            .await?
            .ok_or(SettlementError::PlanNotFound(plan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::models::{PlanTerms, ReturnKind};
    use crate::rental::store::{FixedClock, InMemoryBookingStore, InMemoryPlanCatalog};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap() + Duration::days(n)
    }

    struct Fixture {
        engine: SettlementEngine,
        plans: InMemoryPlanCatalog,
        bookings: InMemoryBookingStore,
        booking: Booking,
    }

    async fn fixture(now: DateTime<Utc>) -> Fixture {
        let plans = InMemoryPlanCatalog::new();
        let bookings = InMemoryBookingStore::new();
        let plan = RentalPlan::new(
            "Weekly",
            PlanTerms {
                duration_in_days: 7,
                daily_rate: dec!(30.00),
                early_return_penalty_rate: dec!(0.20),
                late_return_daily_surcharge: dec!(50.00),
                currency: "USD".to_string(),
            },
        )
        .unwrap();
        plans.upsert_plan(plan.clone()).await;

        let booking = Booking::open(&plan, Uuid::new_v4(), Uuid::new_v4(), day(0), day(0)).unwrap();
        bookings.insert_booking(&booking).await.unwrap();

        let engine = SettlementEngine::new(
            Arc::new(plans.clone()),
            Arc::new(bookings.clone()),
            Arc::new(FixedClock(now)),
        );
        Fixture {
            engine,
            plans,
            bookings,
            booking,
        }
    }

    #[tokio::test]
    async fn test_finalize_closes_booking() {
        let f = fixture(day(7)).await;

        let breakdown = f.engine.finalize(f.booking.id, Some(day(9))).await.unwrap();
        assert_eq!(breakdown.total_amount, dec!(310.00));
        assert!(!breakdown.dry_run);

        let stored = f.bookings.get_booking(f.booking.id).await.unwrap().unwrap();
        assert!(stored.is_closed());
        assert_eq!(stored.actual_return_date, Some(day(9)));
        assert_eq!(stored.total_charged, Some(dec!(310.00)));
    }

    #[tokio::test]
    async fn test_second_settle_is_already_closed() {
        let f = fixture(day(7)).await;

        f.engine.finalize(f.booking.id, Some(day(5))).await.unwrap();
        let err = f.engine.finalize(f.booking.id, Some(day(9))).await.unwrap_err();
        assert!(matches!(
            err,
            SettlementError::AlreadyClosed { total_charged: Some(total), .. } if total == dec!(162.00)
        ));

        let stored = f.engine.get_booking(f.booking.id).await.unwrap();
        assert_eq!(stored.total_charged, Some(dec!(162.00)));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_booking_open() {
        let f = fixture(day(7)).await;

        let breakdown = f.engine.settle(f.booking.id, Some(day(7)), true).await.unwrap();
        assert!(breakdown.dry_run);
        assert_eq!(breakdown.return_kind, ReturnKind::OnTime);

        let stored = f.engine.get_booking(f.booking.id).await.unwrap();
        assert_eq!(stored, f.booking);
    }

    #[tokio::test]
    async fn test_missing_date_uses_clock() {
        let f = fixture(day(9)).await;

        let breakdown = f.engine.finalize(f.booking.id, None).await.unwrap();
        assert_eq!(breakdown.actual_return_date, day(9));
        assert_eq!(breakdown.days_overdue, 2);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let f = fixture(day(7)).await;
        let missing = Uuid::new_v4();

        let err = f.engine.finalize(missing, Some(day(7))).await.unwrap_err();
        assert!(matches!(err, SettlementError::BookingNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_missing_plan_is_not_found() {
        let f = fixture(day(7)).await;
        let orphan = Booking {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            ..f.booking.clone()
        };
        f.bookings.insert_booking(&orphan).await.unwrap();

        let err = f.engine.finalize(orphan.id, Some(day(7))).await.unwrap_err();
        assert!(matches!(err, SettlementError::PlanNotFound(id) if id == orphan.plan_id));
        assert!(f.engine.get_booking(orphan.id).await.unwrap().is_open());
    }

    #[tokio::test]
    async fn test_inactive_plan_still_settles() {
        let f = fixture(day(7)).await;
        let plan = f.engine.get_plan(f.booking.plan_id).await.unwrap();
        f.plans.upsert_plan(plan.deactivate()).await;

        let breakdown = f.engine.finalize(f.booking.id, Some(day(7))).await.unwrap();
        assert_eq!(breakdown.total_amount, dec!(210.00));
    }

    #[tokio::test]
    async fn test_plan_edit_does_not_reprice_booking() {
        let f = fixture(day(7)).await;
        let mut plan = f.engine.get_plan(f.booking.plan_id).await.unwrap();
        plan.daily_rate = dec!(100.00);
        f.plans.upsert_plan(plan).await;

        let breakdown = f.engine.finalize(f.booking.id, Some(day(7))).await.unwrap();
        assert_eq!(breakdown.base_amount, dec!(210.00));
    }

    #[tokio::test]
    async fn test_invalid_return_date_persists_nothing() {
        let f = fixture(day(7)).await;

        let err = f
            .engine
            .finalize(f.booking.id, Some(day(0) - Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidReturnDate { .. }));
        assert_eq!(f.engine.get_booking(f.booking.id).await.unwrap(), f.booking);
    }
}
