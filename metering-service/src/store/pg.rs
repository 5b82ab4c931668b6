use anyhow::Result;
use metering_core::db::{profile_queries, reading_queries};
use metering_core::domain::{Connection, MeterReading, Profile};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl super::ProfileStore for PgProfileStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>> {
        profile_queries::find_by_name(&self.pool, name).await
    }

    async fn find_all(&self) -> Result<Vec<Profile>> {
        profile_queries::find_all(&self.pool).await
    }

    async fn save_all(&self, profiles: Vec<Profile>) -> Result<Vec<Profile>> {
        profile_queries::save_all(&self.pool, &profiles).await?;
        Ok(profiles)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        profile_queries::delete(&self.pool, name).await
    }
}

#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl super::ReadingStore for PgReadingStore {
    async fn save(&self, meter_reading: MeterReading) -> Result<()> {
        reading_queries::save(&self.pool, &meter_reading).await
    }

    async fn find_by_connection(&self, connection: &Connection) -> Result<Option<MeterReading>> {
        reading_queries::find_by_connection(&self.pool, connection).await
    }

    async fn find_all(&self) -> Result<Vec<MeterReading>> {
        reading_queries::find_all(&self.pool).await
    }

    async fn delete(&self, connection: &Connection) -> Result<()> {
        reading_queries::delete(&self.pool, connection).await
    }
}
