use anyhow::{anyhow, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Connection, MeterReading, MeterRecord, Month};

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    profile_name: String,
    connection_id: String,
    month: String,
    reading: i64,
}

impl RecordRow {
    fn record(&self) -> Result<MeterRecord> {
        let month = self.month.parse::<Month>().map_err(|e| {
            anyhow!(
                "corrupt meter record for {}/{}: {e}",
                self.profile_name,
                self.connection_id
            )
        })?;
        Ok(MeterRecord {
            month,
            reading: self.reading,
        })
    }
}

/// Persist a validated yearly aggregate, replacing any previous aggregate for
/// the same connection key. Delete and insert run in one transaction.
pub async fn save(pool: &PgPool, meter_reading: &MeterReading) -> Result<()> {
    let conn = &meter_reading.connection;
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM meter_records WHERE profile_name = $1 AND connection_id = $2",
    )
    .bind(&conn.profile_name)
    .bind(&conn.connection_id)
    .execute(&mut *tx)
    .await?;

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO meter_records (profile_name, connection_id, month, reading) ",
    );
    builder.push_values(&meter_reading.meter_records, |mut b, record| {
        b.push_bind(&conn.profile_name)
            .push_bind(&conn.connection_id)
            .push_bind(record.month.as_str())
            .push_bind(record.reading);
    });
    builder.build().execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(())
}

/// Fetch the stored aggregate for one connection, records in calendar order.
pub async fn find_by_connection(
    pool: &PgPool,
    connection: &Connection,
) -> Result<Option<MeterReading>> {
    let rows = sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT profile_name, connection_id, month, reading
        FROM meter_records
        WHERE profile_name = $1 AND connection_id = $2
        "#,
    )
    .bind(&connection.profile_name)
    .bind(&connection.connection_id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut meter_records = Vec::with_capacity(rows.len());
    for row in &rows {
        meter_records.push(row.record()?);
    }
    meter_records.sort_by_key(|r| r.month.sort_index());

    Ok(Some(MeterReading {
        connection: connection.clone(),
        meter_records,
    }))
}

/// Fetch every stored aggregate.
pub async fn find_all(pool: &PgPool) -> Result<Vec<MeterReading>> {
    let rows = sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT profile_name, connection_id, month, reading
        FROM meter_records
        ORDER BY profile_name, connection_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut readings: Vec<MeterReading> = Vec::new();
    for row in &rows {
        let record = row.record()?;
        match readings.last_mut() {
            Some(current)
                if current.connection.profile_name == row.profile_name
                    && current.connection.connection_id == row.connection_id =>
            {
                current.meter_records.push(record);
            }
            _ => readings.push(MeterReading {
                connection: Connection::new(
                    row.profile_name.clone(),
                    row.connection_id.clone(),
                ),
                meter_records: vec![record],
            }),
        }
    }
    for reading in &mut readings {
        reading.meter_records.sort_by_key(|r| r.month.sort_index());
    }

    Ok(readings)
}

pub async fn delete(pool: &PgPool, connection: &Connection) -> Result<()> {
    sqlx::query(
        "DELETE FROM meter_records WHERE profile_name = $1 AND connection_id = $2",
    )
    .bind(&connection.profile_name)
    .bind(&connection.connection_id)
    .execute(pool)
    .await?;
    Ok(())
}
