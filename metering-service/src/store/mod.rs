pub mod memory;
pub mod pg;

use anyhow::Result;
use metering_core::domain::{Connection, MeterReading, Profile};

pub use memory::{MemoryProfileStore, MemoryReadingStore};
pub use pg::{PgProfileStore, PgReadingStore};

/// Lookup and persistence of allocation profiles. Failures here are backing
/// service failures and propagate uncaught through the batch core.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>>;
    async fn find_all(&self) -> Result<Vec<Profile>>;
    async fn save_all(&self, profiles: Vec<Profile>) -> Result<Vec<Profile>>;
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Persistence of validated yearly reading aggregates, keyed by connection.
/// A save replaces any previous aggregate for the same key.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn save(&self, meter_reading: MeterReading) -> Result<()>;
    async fn find_by_connection(&self, connection: &Connection) -> Result<Option<MeterReading>>;
    async fn find_all(&self) -> Result<Vec<MeterReading>>;
    async fn delete(&self, connection: &Connection) -> Result<()>;
}
