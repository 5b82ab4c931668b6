use std::{env, fs::File, sync::Arc};

use anyhow::{bail, Context, Result};
use metering_core::domain::{Month, RawReading};
use metering_service::{
    config::AppConfig,
    observability,
    service::BatchService,
    store::{PgProfileStore, PgReadingStore},
};
use sqlx::postgres::PgPoolOptions;

/// Bulk-loads raw readings from a CSV file through the same validation path
/// as the HTTP endpoint.
///
/// Expected header columns (by name): profile_name, connection_id, month
/// (JAN..DEC), reading.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_readings <csv_file_path>");
    }
    let file_path = &args[1];

    let batch = read_csv(file_path)?;
    tracing::info!(records = batch.len(), file = %file_path, "parsed backfill file");

    // Load configuration (can point METERING_CONFIG to a backfill-specific file).
    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let service = BatchService::new(
        Arc::new(PgProfileStore::new(pool.clone())),
        Arc::new(PgReadingStore::new(pool)),
    );

    let statuses = service.submit_readings(batch).await?;
    let failures = statuses.iter().filter(|s| s.message != "SUCCESS").count();
    for status in &statuses {
        tracing::info!(
            profile = %status.profile_name,
            connection = status.connection_id.as_deref().unwrap_or("-"),
            message = %status.message,
            "backfill status"
        );
    }
    tracing::info!(
        total = statuses.len(),
        failures,
        "backfill complete"
    );

    Ok(())
}

fn read_csv(path: &str) -> Result<Vec<RawReading>> {
    let file = File::open(path).with_context(|| format!("failed to open CSV file '{path}'"))?;
    let mut rdr = csv::Reader::from_reader(file);
    let headers = rdr.headers().context("failed to read CSV headers")?.clone();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing column '{name}' in CSV header"))
    };
    let profile_col = column("profile_name")?;
    let connection_col = column("connection_id")?;
    let month_col = column("month")?;
    let reading_col = column("reading")?;

    let mut batch = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("failed to read CSV record {line}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let month: Month = field(month_col)
            .parse()
            .map_err(|e| anyhow::anyhow!("record {line}: {e}"))?;
        let reading: i64 = field(reading_col)
            .parse()
            .with_context(|| format!("record {line}: invalid reading '{}'", field(reading_col)))?;

        batch.push(RawReading {
            profile_name: field(profile_col).to_string(),
            connection_id: field(connection_col).to_string(),
            month,
            reading,
        });
    }

    Ok(batch)
}
