pub mod error;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metering_core::domain::{Connection, MeterReading, Profile, RawReading};

use crate::service::{BatchService, ProfileInput, ReadingStatus};
use crate::store::{ProfileStore, ReadingStore};
use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BatchService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub readings: Arc<dyn ReadingStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/meterreadings",
            post(create_meter_readings)
                .get(get_all_meter_readings)
                .delete(delete_meter_reading),
        )
        .route(
            "/api/meterreadings/:profilename/:connectionid",
            get(get_meter_reading),
        )
        .route("/api/profiles", post(create_profiles).get(get_all_profiles))
        .route(
            "/api/profiles/:name",
            get(get_profile).delete(delete_profile),
        )
        .with_state(state)
}

/// POST /api/meterreadings: validate and persist a bulk reading batch.
/// Always 201 with the per-connection status list; individual failures are
/// reported inside the list, not as an HTTP error.
async fn create_meter_readings(
    State(state): State<AppState>,
    Json(batch): Json<Vec<RawReading>>,
) -> Result<(StatusCode, Json<Vec<ReadingStatus>>), ApiError> {
    tracing::debug!(records = batch.len(), "create meter readings");
    let statuses = state.service.submit_readings(batch).await?;
    Ok((StatusCode::CREATED, Json(statuses)))
}

async fn get_all_meter_readings(
    State(state): State<AppState>,
) -> Result<Json<Vec<MeterReading>>, ApiError> {
    tracing::debug!("get all meter readings");
    Ok(Json(state.readings.find_all().await?))
}

async fn get_meter_reading(
    State(state): State<AppState>,
    Path((profile_name, connection_id)): Path<(String, String)>,
) -> Result<Json<MeterReading>, ApiError> {
    tracing::debug!(profile = %profile_name, connection = %connection_id, "get meter reading");
    let connection = Connection::new(profile_name, connection_id);
    state
        .readings
        .find_by_connection(&connection)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// DELETE /api/meterreadings: body carries the connection key.
async fn delete_meter_reading(
    State(state): State<AppState>,
    Json(connection): Json<Connection>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!(profile = %connection.profile_name, connection = %connection.connection_id, "delete meter reading");
    state.readings.delete(&connection).await?;
    Ok(StatusCode::OK)
}

/// POST /api/profiles: all-or-nothing profile creation; one invalid
/// candidate rejects the whole submission with 400.
async fn create_profiles(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<ProfileInput>>,
) -> Result<(StatusCode, Json<Vec<Profile>>), ApiError> {
    tracing::debug!(rows = inputs.len(), "create profiles");
    let profiles = state.service.create_profiles(inputs).await?;
    Ok((StatusCode::CREATED, Json(profiles)))
}

async fn get_all_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    tracing::debug!("get all profiles");
    Ok(Json(state.profiles.find_all().await?))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    tracing::debug!(profile = %name, "get profile");
    state
        .profiles
        .find_by_name(&name)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn delete_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!(profile = %name, "delete profile");
    state.profiles.delete(&name).await?;
    Ok(StatusCode::OK)
}
