use std::collections::BTreeMap;

use anyhow::Result;
use metering_core::domain::{Connection, MeterReading, Profile};
use tokio::sync::RwLock;

/// Map-backed [`super::ProfileStore`] for tests and local runs without a
/// database.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<BTreeMap<String, Profile>>,
}

#[async_trait::async_trait]
impl super::ProfileStore for MemoryProfileStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }

    async fn save_all(&self, profiles: Vec<Profile>) -> Result<Vec<Profile>> {
        let mut guard = self.profiles.write().await;
        for profile in &profiles {
            guard.insert(profile.name().to_string(), profile.clone());
        }
        Ok(profiles)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.profiles.write().await.remove(name);
        Ok(())
    }
}

/// Map-backed [`super::ReadingStore`], keyed by (profile name, connection id).
#[derive(Default)]
pub struct MemoryReadingStore {
    readings: RwLock<BTreeMap<(String, String), MeterReading>>,
}

impl MemoryReadingStore {
    fn key(connection: &Connection) -> (String, String) {
        (
            connection.profile_name.clone(),
            connection.connection_id.clone(),
        )
    }
}

#[async_trait::async_trait]
impl super::ReadingStore for MemoryReadingStore {
    async fn save(&self, meter_reading: MeterReading) -> Result<()> {
        let key = Self::key(&meter_reading.connection);
        self.readings.write().await.insert(key, meter_reading);
        Ok(())
    }

    async fn find_by_connection(&self, connection: &Connection) -> Result<Option<MeterReading>> {
        Ok(self.readings.read().await.get(&Self::key(connection)).cloned())
    }

    async fn find_all(&self) -> Result<Vec<MeterReading>> {
        Ok(self.readings.read().await.values().cloned().collect())
    }

    async fn delete(&self, connection: &Connection) -> Result<()> {
        self.readings.write().await.remove(&Self::key(connection));
        Ok(())
    }
}
