use serde::{Deserialize, Serialize};

use super::month::Month;

/// Composite key identifying a single meter/customer pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub profile_name: String,
    pub connection_id: String,
}

impl Connection {
    pub fn new(profile_name: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            connection_id: connection_id.into(),
        }
    }
}

/// One raw submitted reading, as it arrives in a bulk batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub profile_name: String,
    pub connection_id: String,
    pub month: Month,
    pub reading: i64,
}

/// One month's validated cumulative meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterRecord {
    pub month: Month,
    pub reading: i64,
}

/// A connection's full validated year: exactly 12 records, one per month,
/// ascending cumulative values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    pub connection: Connection,
    pub meter_records: Vec<MeterRecord>,
}
