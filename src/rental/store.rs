//! Collaborator interfaces consumed by the settlement engine.
//!
//! `queries` provides the Postgres implementations; the in-memory stores here
//! back local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::{PlanError, StoreError};
use super::models::{Booking, BookingClosure, RentalPlan};

/// Read access to plan definitions
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RentalPlan>, StoreError>;
}

/// Booking persistence with a single atomic conditional close
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    /// Close the booking only if it is still open at `expected_version`.
    ///
    /// Returns false when the booking is missing, already closed, or was
    /// written since it was read.
    async fn compare_and_close(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        closure: &BookingClosure,
    ) -> Result<bool, StoreError>;
}

/// Source of the current time when a caller supplies no return date
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for replays and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanCatalog {
    plans: Arc<RwLock<HashMap<Uuid, RentalPlan>>>,
}

impl InMemoryPlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from seed plans, rejecting any that break plan invariants
    pub async fn with_plans(plans: Vec<RentalPlan>) -> Result<Self, PlanError> {
        let catalog = Self::new();
        for plan in plans {
            plan.terms().validate()?;
            catalog.upsert_plan(plan).await;
        }
        Ok(catalog)
    }

    /// Administrative create-or-replace of a plan definition
    pub async fn upsert_plan(&self, plan: RentalPlan) {
        self.plans.write().await.insert(plan.id, plan);
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RentalPlan>, StoreError> {
        Ok(self.plans.read().await.get(&plan_id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&booking_id).cloned())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(StoreError::DuplicateBooking(booking.id));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn compare_and_close(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        closure: &BookingClosure,
    ) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings
            .get_mut(&booking_id)
            .map(|booking| booking.close_if_current(expected_version, closure))
            .unwrap_or(false))
    }
}
