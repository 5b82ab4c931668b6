use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use metering_core::domain::{
    validate_connection, Connection, Fraction, Month, Profile, ProfileBuilder, RawReading,
};
use serde::{Deserialize, Serialize};

use crate::store::{ProfileStore, ReadingStore};

/// One fraction submission row: profile name, month, and the fraction value
/// as a decimal string, as it arrives on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub month: Month,
    pub fraction: String,
}

/// Per-connection (or per missing-profile-group) outcome of a batch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatus {
    pub profile_name: String,
    pub connection_id: Option<String>,
    pub message: String,
}

impl ReadingStatus {
    fn success(profile_name: &str, connection_id: &str) -> Self {
        Self {
            profile_name: profile_name.to_string(),
            connection_id: Some(connection_id.to_string()),
            message: "SUCCESS".to_string(),
        }
    }

    fn failure(profile_name: &str, connection_id: Option<&str>, reason: impl std::fmt::Display) -> Self {
        Self {
            profile_name: profile_name.to_string(),
            connection_id: connection_id.map(str::to_string),
            message: format!("FAILURE, {reason}"),
        }
    }
}

/// Profile creation is all-or-nothing: one invalid candidate rejects the
/// whole submission before anything is persisted.
#[derive(Debug, thiserror::Error)]
pub enum ProfileCreateError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Drives the per-batch validation flow: group by profile name, resolve the
/// profile, group by connection id, validate each connection, persist the
/// successes, and accumulate one status per connection.
pub struct BatchService {
    profiles: Arc<dyn ProfileStore>,
    readings: Arc<dyn ReadingStore>,
}

impl BatchService {
    pub fn new(profiles: Arc<dyn ProfileStore>, readings: Arc<dyn ReadingStore>) -> Self {
        Self { profiles, readings }
    }

    /// Builds and persists every candidate profile in `inputs`, grouped by
    /// name. Duplicate (name, month) rows are dropped first-wins by the
    /// builder. Any candidate failing the total-equals-one invariant rejects
    /// the entire submission.
    pub async fn create_profiles(
        &self,
        inputs: Vec<ProfileInput>,
    ) -> Result<Vec<Profile>, ProfileCreateError> {
        let mut grouped: BTreeMap<String, Vec<(Month, String)>> = BTreeMap::new();
        for input in inputs {
            grouped
                .entry(input.name)
                .or_default()
                .push((input.month, input.fraction));
        }

        let mut to_save = Vec::with_capacity(grouped.len());
        for (name, rows) in grouped {
            let mut builder = ProfileBuilder::new(name.clone());
            for (month, fraction) in rows {
                let value: f64 = fraction.trim().parse().map_err(|_| {
                    ProfileCreateError::Invalid(format!(
                        "invalid fraction '{fraction}' for profile {name} month {month}"
                    ))
                })?;
                builder.add_fraction(Fraction::new(month, value));
            }

            match builder.build() {
                Ok(profile) => to_save.push(profile),
                Err(e) => {
                    tracing::error!(profile = %name, error = %e, "profile rejected");
                    metrics::counter!("profiles_rejected_total").increment(1);
                    return Err(ProfileCreateError::Invalid(e.to_string()));
                }
            }
        }

        let saved = self.profiles.save_all(to_save).await?;
        metrics::counter!("profiles_created_total").increment(saved.len() as u64);
        Ok(saved)
    }

    /// Validates and persists a bulk reading batch.
    ///
    /// Returns one status per connection evaluated, plus one per profile-name
    /// group whose profile does not exist. A failed connection never aborts
    /// the batch, and already-persisted successes are not rolled back.
    pub async fn submit_readings(&self, batch: Vec<RawReading>) -> Result<Vec<ReadingStatus>> {
        metrics::counter!("reading_batch_requests_total").increment(1);

        let mut result = Vec::new();

        // Pure fan-out over the immutable batch; BTreeMap keeps the status
        // list deterministic for identical input.
        for (profile_name, group) in group_by_profile(batch) {
            let profile = match self.profiles.find_by_name(&profile_name).await? {
                Some(profile) => profile,
                None => {
                    tracing::warn!(profile = %profile_name, "profile not found, skipping group");
                    metrics::counter!("reading_profile_not_found_total").increment(1);
                    result.push(ReadingStatus::failure(
                        &profile_name,
                        None,
                        "Profile NOT FOUND",
                    ));
                    continue;
                }
            };

            for (connection_id, readings) in group_by_connection(group) {
                let connection = Connection::new(profile_name.clone(), connection_id.clone());
                match validate_connection(connection, &readings, &profile) {
                    Ok(meter_reading) => {
                        self.readings.save(meter_reading).await?;
                        metrics::counter!("reading_connections_accepted_total").increment(1);
                        result.push(ReadingStatus::success(&profile_name, &connection_id));
                    }
                    Err(failure) => {
                        tracing::warn!(
                            profile = %profile_name,
                            connection = %connection_id,
                            reason = %failure,
                            "connection rejected"
                        );
                        metrics::counter!("reading_connections_rejected_total").increment(1);
                        result.push(ReadingStatus::failure(
                            &profile_name,
                            Some(&connection_id),
                            failure,
                        ));
                    }
                }
            }
        }

        Ok(result)
    }
}

fn group_by_profile(batch: Vec<RawReading>) -> BTreeMap<String, Vec<RawReading>> {
    let mut groups: BTreeMap<String, Vec<RawReading>> = BTreeMap::new();
    for reading in batch {
        groups
            .entry(reading.profile_name.clone())
            .or_default()
            .push(reading);
    }
    groups
}

fn group_by_connection(group: Vec<RawReading>) -> BTreeMap<String, Vec<RawReading>> {
    let mut groups: BTreeMap<String, Vec<RawReading>> = BTreeMap::new();
    for reading in group {
        groups
            .entry(reading.connection_id.clone())
            .or_default()
            .push(reading);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_partitions_by_profile_then_connection() {
        let batch = vec![
            RawReading {
                profile_name: "B".into(),
                connection_id: "2".into(),
                month: Month::Jan,
                reading: 1,
            },
            RawReading {
                profile_name: "A".into(),
                connection_id: "1".into(),
                month: Month::Jan,
                reading: 2,
            },
            RawReading {
                profile_name: "A".into(),
                connection_id: "1".into(),
                month: Month::Feb,
                reading: 3,
            },
        ];

        let by_profile = group_by_profile(batch);
        assert_eq!(by_profile.len(), 2);
        assert_eq!(by_profile["A"].len(), 2);

        let by_connection = group_by_connection(by_profile["A"].clone());
        assert_eq!(by_connection.len(), 1);
        assert_eq!(by_connection["1"].len(), 2);
    }
}
