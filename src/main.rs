use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_ledger::api::{self, AppState, RoleDirectory};
use storefront_ledger::config::{Config, StorageBackend};
use storefront_ledger::domain::inventory::Product;
use storefront_ledger::metrics::{self, Metrics};
use storefront_ledger::storage::{MemoryStore, PgStore, Store};
use storefront_ledger::utils::{retry_with_backoff, RetryConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront_ledger=debug"));
    if config.logging.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .with(filter)
            .init();
    }

    tracing::info!(
        backend = ?config.storage.backend,
        admins = config.auth.admin_user_ids.len(),
        "🚀 Starting storefront ledger"
    );

    let metrics = Arc::new(Metrics::new()?);
    let roles = RoleDirectory::new(config.auth.admin_user_ids.iter().copied());

    match config.storage.backend {
        StorageBackend::Memory => {
            let store = MemoryStore::new();
            for seed in &config.storage.seed_products {
                store.put_product(Product::from(seed)).await;
            }
            tracing::warn!("In-memory storage selected, state is lost on exit");
            serve(config, Arc::new(store), metrics, roles).await
        }
        StorageBackend::Postgres => {
            let url = config.storage.database_url.clone();
            let max_connections = config.storage.max_connections;
            tracing::info!("Connecting to Postgres...");
            let store = retry_with_backoff(RetryConfig::database_connect(), |attempt| {
                let url = url.clone();
                async move {
                    tracing::debug!(attempt, "Opening connection pool");
                    PgStore::connect(&url, max_connections).await
                }
            })
            .await?;
            store.init().await?;
            for seed in &config.storage.seed_products {
                store.upsert_product(&Product::from(seed)).await?;
            }
            serve(config, Arc::new(store), metrics, roles).await
        }
    }
}

async fn serve<S: Store>(
    config: Config,
    store: Arc<S>,
    metrics: Arc<Metrics>,
    roles: RoleDirectory,
) -> anyhow::Result<()> {
    let state = web::Data::new(AppState::new(store, metrics.clone(), roles));

    let metrics_server = metrics::start_metrics_server(
        metrics.registry().clone(),
        config.server.host.clone(),
        config.server.metrics_port,
    );

    tracing::info!(
        "🛒 Ledger API listening on http://{}:{}",
        config.server.host,
        config.server.port
    );
    let api_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure::<S>)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run();

    tokio::try_join!(api_server, metrics_server)?;
    Ok(())
}
