use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use common_shelf::{
    api::{create_router, AppState},
    config::Config,
    db::{self, Cache, InMemoryProfileStore, PgProfileStore, UserProfileStore},
    services::{catalog::build_http_client, Catalog, OpenLibraryCatalog, RecommendationPipeline},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("common_shelf=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        catalog = %config.catalog_api_url,
        deadline_secs = config.request_deadline_secs,
        "Loaded configuration"
    );

    let http_client = build_http_client(config.catalog_timeout())?;
    let mut open_library = OpenLibraryCatalog::new(http_client, &config.catalog_api_url)?;

    let mut cache_writer = None;
    if let Some(redis_url) = &config.redis_url {
        let client = db::create_redis_client(redis_url).context("Invalid REDIS_URL")?;
        let (cache, writer) = Cache::new(client);
        open_library = open_library.with_cache(cache, config.cache_ttl_secs);
        cache_writer = Some(writer);
        tracing::info!("Catalog responses cached in Redis");
    }
    let catalog: Arc<dyn Catalog> = Arc::new(open_library);

    let profiles: Arc<dyn UserProfileStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            tracing::info!("Reader profiles loaded from PostgreSQL");
            Arc::new(PgProfileStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using built-in sample readers");
            Arc::new(InMemoryProfileStore::seeded())
        }
    };

    let pipeline = RecommendationPipeline::from_config(profiles, catalog, &config);
    let app = create_router(AppState::new(pipeline));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
