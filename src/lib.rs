//! Motorcycle rental settlement service.
//!
//! The pricing core lives in [`rental`]; this crate root wires it to
//! storage, caching and an axum router.

pub mod cache;
pub mod config;
pub mod error;
pub mod rental;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use cache::CachedPlanCatalog;
use config::Config;
use rental::queries::{PgBookingStore, PgPlanCatalog};
use rental::store::{BookingStore, Clock, InMemoryBookingStore, InMemoryPlanCatalog, PlanCatalog};
use rental::{BookingService, SettlementEngine, Simulator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: SettlementEngine,
    pub simulator: Simulator,
    pub bookings: BookingService,
    pub plan_cache: CachedPlanCatalog,
}

impl AppState {
    pub fn new(
        plans: Arc<dyn PlanCatalog>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let plan_cache =
            CachedPlanCatalog::new(plans, config.plan_cache_capacity, config.plan_cache_ttl());
        let cached: Arc<dyn PlanCatalog> = Arc::new(plan_cache.clone());

        let engine = SettlementEngine::new(cached.clone(), bookings.clone(), clock.clone());
        Self {
            simulator: Simulator::new(engine.clone()),
            bookings: BookingService::new(cached, bookings, clock),
            engine,
            plan_cache,
        }
    }

    pub fn postgres(pool: PgPool, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self::new(
            Arc::new(PgPlanCatalog::new(pool.clone())),
            Arc::new(PgBookingStore::new(pool)),
            clock,
            config,
        )
    }

    pub fn in_memory(
        plans: InMemoryPlanCatalog,
        bookings: InMemoryBookingStore,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self::new(Arc::new(plans), Arc::new(bookings), clock, config)
    }
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/rentals", rental::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "cache": state.plan_cache.stats(),
    }))
}
