//! Booking creation.
//!
//! Opens bookings against active plans. Closing a booking is left to the
//! settlement engine.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::errors::BookingError;
use super::models::Booking;
use super::store::{BookingStore, Clock, PlanCatalog};

/// Terms requested for a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub motorcycle_id: Uuid,
    pub renter_id: Uuid,
    pub plan_id: Uuid,
    /// Defaults to now when absent
    pub planned_start_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct BookingService {
    plans: Arc<dyn PlanCatalog>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
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

    pub async fn open_booking(&self, request: NewBooking) -> Result<Booking, BookingError> {
        let plan = self
            .plans
            .get_plan(request.plan_id)
            .await?
            .ok_or(BookingError::PlanNotFound(request.plan_id))?;

        let now = self.clock.now();
        let booking = Booking::open(
            &plan,
            request.motorcycle_id,
            request.renter_id,
            request.planned_start_date.unwrap_or(now),
            now,
        )?;
        self.bookings.insert_booking(&booking).await?;

        info!(
            booking_id = %booking.id,
            plan_id = %plan.id,
            motorcycle_id = %booking.motorcycle_id,
            planned_end_date = %booking.planned_end_date,
            "Booking opened"
        );
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::models::{BookingStatus, PlanTerms, RentalPlan};
    use crate::rental::store::{FixedClock, InMemoryBookingStore, InMemoryPlanCatalog};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap()
    }

    fn terms() -> PlanTerms {
        PlanTerms {
            duration_in_days: 3,
            daily_rate: dec!(55.00),
            early_return_penalty_rate: dec!(0.25),
            late_return_daily_surcharge: dec!(70.00),
            currency: "USD".to_string(),
        }
    }

    async fn service_with(plan: &RentalPlan) -> (BookingService, InMemoryBookingStore) {
        let plans = InMemoryPlanCatalog::new();
        plans.upsert_plan(plan.clone()).await;
        let bookings = InMemoryBookingStore::new();
        let service = BookingService::new(
            Arc::new(plans),
            Arc::new(bookings.clone()),
            Arc::new(FixedClock(now())),
        );
        (service, bookings)
    }

    fn request(plan_id: Uuid, start: Option<DateTime<Utc>>) -> NewBooking {
        NewBooking {
            motorcycle_id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            plan_id,
            planned_start_date: start,
        }
    }

    #[tokio::test]
    async fn test_open_booking_persists_open_record() {
        let plan = RentalPlan::new("Long weekend", terms()).unwrap();
        let (service, bookings) = service_with(&plan).await;
        let start = now() + Duration::days(2);

        let booking = service.open_booking(request(plan.id, Some(start))).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Open);
        assert_eq!(booking.planned_end_date, start + Duration::days(3));
        assert_eq!(booking.created_at, now());

        let stored = bookings.get_booking(booking.id).await.unwrap();
        assert_eq!(stored, Some(booking));
    }

    #[tokio::test]
    async fn test_open_booking_defaults_start_to_now() {
        let plan = RentalPlan::new("Long weekend", terms()).unwrap();
        let (service, _) = service_with(&plan).await;

        let booking = service.open_booking(request(plan.id, None)).await.unwrap();
        assert_eq!(booking.planned_start_date, now());
    }

    #[tokio::test]
    async fn test_open_booking_rejects_inactive_plan() {
        let plan = RentalPlan::new("Retired", terms()).unwrap().deactivate();
        let (service, _) = service_with(&plan).await;

        let err = service.open_booking(request(plan.id, None)).await.unwrap_err();
        assert!(matches!(err, BookingError::PlanInactive(_)));
    }

    #[tokio::test]
    async fn test_open_booking_unknown_plan() {
        let plan = RentalPlan::new("Long weekend", terms()).unwrap();
        let (service, _) = service_with(&plan).await;
        let missing = Uuid::new_v4();

        let err = service.open_booking(request(missing, None)).await.unwrap_err();
        assert!(matches!(err, BookingError::PlanNotFound(id) if id == missing));
    }
}
