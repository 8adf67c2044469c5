//! Postgres-backed plan catalog and booking store.
//!
//! Tables are created by `migrations/0001_rentals.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::errors::StoreError;
use super::models::{Booking, BookingClosure, BookingStatus, PlanTerms, RentalPlan};
use super::store::{BookingStore, PlanCatalog};

/// Booking row from rental_bookings, with plan terms flattened into columns
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub motorcycle_id: Uuid,
    pub renter_id: Uuid,
    pub plan_id: Uuid,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub duration_in_days: i32,
    pub daily_rate: Decimal,
    pub early_return_penalty_rate: Decimal,
    pub late_return_daily_surcharge: Decimal,
    pub currency: String,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub total_charged: Option<Decimal>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "booking {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(Booking {
            id: row.id,
            motorcycle_id: row.motorcycle_id,
            renter_id: row.renter_id,
            plan_id: row.plan_id,
            planned_start_date: row.planned_start_date,
            planned_end_date: row.planned_end_date,
            terms: PlanTerms {
                duration_in_days: row.duration_in_days,
                daily_rate: row.daily_rate,
                early_return_penalty_rate: row.early_return_penalty_rate,
                late_return_daily_surcharge: row.late_return_daily_surcharge,
                currency: row.currency,
            },
            actual_return_date: row.actual_return_date,
            status,
            total_charged: row.total_charged,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgPlanCatalog {
    pool: PgPool,
}

impl PgPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanCatalog for PgPlanCatalog {
    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RentalPlan>, StoreError> {
        let plan = sqlx::query_as::<_, RentalPlan>(
            r#"
            SELECT
                id, name, duration_in_days, daily_rate,
                early_return_penalty_rate, late_return_daily_surcharge,
                currency, is_active
            FROM rental_plans
            WHERE id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}

#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT
                id, motorcycle_id, renter_id, plan_id,
                planned_start_date, planned_end_date,
                duration_in_days, daily_rate,
                early_return_penalty_rate, late_return_daily_surcharge, currency,
                actual_return_date, status, total_charged, version, created_at
            FROM rental_bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO rental_bookings
            (id, motorcycle_id, renter_id, plan_id,
             planned_start_date, planned_end_date,
             duration_in_days, daily_rate,
             early_return_penalty_rate, late_return_daily_surcharge, currency,
             actual_return_date, status, total_charged, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(booking.id)
        .bind(booking.motorcycle_id)
        .bind(booking.renter_id)
        .bind(booking.plan_id)
        .bind(booking.planned_start_date)
        .bind(booking.planned_end_date)
        .bind(booking.terms.duration_in_days)
        .bind(booking.terms.daily_rate)
        .bind(booking.terms.early_return_penalty_rate)
        .bind(booking.terms.late_return_daily_surcharge)
        .bind(&booking.terms.currency)
        .bind(booking.actual_return_date)
        .bind(booking.status.as_str())
        .bind(booking.total_charged)
        .bind(booking.version)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateBooking(booking.id));
        }
        Ok(())
    }

    async fn compare_and_close(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        closure: &BookingClosure,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE rental_bookings
            SET status = 'closed',
                actual_return_date = $2,
                total_charged = $3,
                version = version + 1
            WHERE id = $1
              AND status = 'open'
              AND version = $4
            "#,
        )
        .bind(booking_id)
        .bind(closure.actual_return_date)
        .bind(closure.total_charged)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> BookingRow {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        BookingRow {
            id: Uuid::new_v4(),
            motorcycle_id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            planned_start_date: start,
            planned_end_date: start + chrono::Duration::days(3),
            duration_in_days: 3,
            daily_rate: dec!(25.00),
            early_return_penalty_rate: dec!(0.10),
            late_return_daily_surcharge: dec!(40.00),
            currency: "EUR".to_string(),
            actual_return_date: None,
            status: status.to_string(),
            total_charged: None,
            version: 0,
            created_at: start,
        }
    }

    #[test]
    fn test_booking_row_conversion() {
        let booking = Booking::try_from(row("open")).unwrap();
        assert!(booking.is_open());
        assert_eq!(booking.terms.daily_rate, dec!(25.00));
        assert_eq!(booking.terms.currency, "EUR");
    }

    #[test]
    fn test_booking_row_with_unknown_status_is_corrupt() {
        let err = Booking::try_from(row("cancelled")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(msg) if msg.contains("cancelled")));
    }
}
