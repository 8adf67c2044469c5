//! Read-only "what would I owe" queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::SettlementError;
use super::models::SettlementBreakdown;
use super::services::SettlementEngine;

/// Runs the settlement engine in dry-run mode only.
///
/// Never takes the close path, so any number of simulations may run against
/// the same booking, including alongside a real settlement. A result
/// obtained during such a race is advisory.
#[derive(Clone)]
pub struct Simulator {
    engine: SettlementEngine,
}

impl Simulator {
    pub fn new(engine: SettlementEngine) -> Self {
        Self { engine }
    }

    pub async fn simulate(
        &self,
        booking_id: Uuid,
        hypothetical_return_date: Option<DateTime<Utc>>,
    ) -> Result<SettlementBreakdown, SettlementError> {
        self.engine
            .settle(booking_id, hypothetical_return_date, true)
            .await
    }
}
