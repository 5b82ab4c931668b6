use std::sync::Arc;

use anyhow::Result;
use metering_service::{
    config::AppConfig,
    http::{self, AppState},
    metrics_server, observability,
    service::BatchService,
    store::{PgProfileStore, PgReadingStore, ProfileStore, ReadingStore},
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool.clone()));
    let readings: Arc<dyn ReadingStore> = Arc::new(PgReadingStore::new(pool));
    let service = Arc::new(BatchService::new(profiles.clone(), readings.clone()));

    let app = http::router(AppState {
        service,
        profiles,
        readings,
    });

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "metering service listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
