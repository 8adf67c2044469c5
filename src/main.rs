use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorent::config::Config;
use motorent::rental::store::{InMemoryBookingStore, InMemoryPlanCatalog, SystemClock};
use motorent::rental::RentalPlan;
use motorent::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motorent=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to read configuration")?;
    let clock = Arc::new(SystemClock);

    let state = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Connected to database");
            AppState::postgres(pool, clock, &config)
        }
        None => {
            warn!("MOTORENT_DATABASE_URL not set; bookings are kept in memory only");
            let plans = match &config.plans_file {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let plans: Vec<RentalPlan> = serde_json::from_str(&raw)
                        .with_context(|| format!("Failed to parse {}", path.display()))?;
                    info!("Loaded {} plans from {}", plans.len(), path.display());
                    InMemoryPlanCatalog::with_plans(plans).await?
                }
                None => InMemoryPlanCatalog::new(),
            };
            AppState::in_memory(plans, InMemoryBookingStore::new(), clock, &config)
        }
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, motorent::app(state))
        .await
        .context("Server error")?;

    Ok(())
}
