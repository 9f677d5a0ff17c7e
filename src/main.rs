//! Tiermart Commerce - marketplace order and wholesale service

use std::sync::Arc;

use anyhow::{Context, Result};
use tiermart_commerce::{
    api::{self, AppState},
    config::{Config, StoreBackend},
    events::EventPublisher,
    store::{memory::MemoryStore, postgres::PgStore, seed_demo_data, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let (store, pg): (Arc<dyn Store>, Option<PgStore>) = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL is required")?;
            let pg = PgStore::connect(url, config.db_max_connections)
                .await
                .context("connecting to Postgres")?;
            let store: Arc<dyn Store> = Arc::new(pg.clone());
            (store, Some(pg))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    if config.payment_key_secret.is_none() {
        tracing::warn!("PAYMENT_KEY_SECRET not set; verified checkout is disabled");
    }

    if config.seed_demo_data {
        seed_demo_data(&*store).await.context("seeding demo data")?;
    }

    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let state = AppState::new(store, config.payment_key_secret.clone(), events).with_demo_seeding(config.seed_demo_data);
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("{} listening on {}", api::SERVICE_NAME, addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    if let Some(pg) = pg {
        pg.close().await;
    }
    Ok(())
}
