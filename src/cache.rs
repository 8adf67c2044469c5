//! In-memory caching using moka
//!
//! Caches plan definitions in front of the plan catalog. Plans change rarely
//! and bookings carry their own copy of the terms, so a stale entry can only
//! affect new bookings until it expires.

use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::rental::errors::StoreError;
use crate::rental::models::RentalPlan;
use crate::rental::store::PlanCatalog;

/// Plan catalog decorator holding recently read plans
#[derive(Clone)]
pub struct CachedPlanCatalog {
    inner: Arc<dyn PlanCatalog>,
    /// Plans (plan id -> RentalPlan)
    plans: Cache<Uuid, Arc<RentalPlan>>,
}

impl CachedPlanCatalog {
    pub fn new(inner: Arc<dyn PlanCatalog>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            plans: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            plans_size: self.plans.entry_count(),
        }
    }
}

#[async_trait]
impl PlanCatalog for CachedPlanCatalog {
    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RentalPlan>, StoreError> {
        if let Some(cached) = self.plans.get(&plan_id).await {
            debug!("Cache HIT for plan: {}", plan_id);
            return Ok(Some((*cached).clone()));
        }

        debug!("Cache MISS for plan: {}", plan_id);
        let plan = self.inner.get_plan(plan_id).await?;
        // Misses are not cached so a newly created plan is visible at once
        if let Some(plan) = &plan {
            self.plans.insert(plan_id, Arc::new(plan.clone())).await;
        }
        Ok(plan)
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub plans_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::models::{PlanTerms, DEFAULT_CURRENCY};
    use crate::rental::store::InMemoryPlanCatalog;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        inner: InMemoryPlanCatalog,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl PlanCatalog for CountingCatalog {
        async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RentalPlan>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_plan(plan_id).await
        }
    }

    fn plan() -> RentalPlan {
        RentalPlan::new(
            "Daily",
            PlanTerms {
                duration_in_days: 1,
                daily_rate: dec!(60.00),
                early_return_penalty_rate: dec!(0),
                late_return_daily_surcharge: dec!(90.00),
                currency: DEFAULT_CURRENCY.to_string(),
            },
        )
        .unwrap()
    }

    async fn setup() -> (Arc<CountingCatalog>, CachedPlanCatalog, RentalPlan) {
        setup_with_ttl(Duration::from_secs(60)).await
    }

    async fn setup_with_ttl(ttl: Duration) -> (Arc<CountingCatalog>, CachedPlanCatalog, RentalPlan) {
        let inner = InMemoryPlanCatalog::new();
        let plan = plan();
        inner.upsert_plan(plan.clone()).await;
        let counting = Arc::new(CountingCatalog {
            inner,
            reads: AtomicUsize::new(0),
        });
        let cached = CachedPlanCatalog::new(counting.clone(), 16, ttl);
        (counting, cached, plan)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let (counting, cached, plan) = setup().await;

        assert_eq!(cached.get_plan(plan.id).await.unwrap(), Some(plan.clone()));
        assert_eq!(cached.get_plan(plan.id).await.unwrap(), Some(plan));
        assert_eq!(counting.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_plan_is_not_cached() {
        let (counting, cached, _) = setup().await;
        let unknown = Uuid::new_v4();

        assert_eq!(cached.get_plan(unknown).await.unwrap(), None);
        assert_eq!(cached.get_plan(unknown).await.unwrap(), None);
        assert_eq!(counting.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_plan_is_reloaded() {
        let (counting, cached, plan) = setup_with_ttl(Duration::from_millis(50)).await;

        cached.get_plan(plan.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cached.get_plan(plan.id).await.unwrap(), Some(plan));
        assert_eq!(counting.reads.load(Ordering::SeqCst), 2);
    }
}
