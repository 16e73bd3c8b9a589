use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::models::{FlightEntry, FlightInput, FlightPatch, MutationResult, PageRequest, PageResponse};
use crate::services::validation::validate_flight;
use crate::services::{Clock, Database, FlightQueryPipeline};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub board: FlightQueryPipeline,
}

impl AppState {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        let board = FlightQueryPipeline::new(db.clone(), clock);
        Self { db, board }
    }
}

/// Board query string. Every value is optional text so that garbage never rejects the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

impl BoardQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::normalize(
            self.page.as_deref(),
            self.sort.as_deref(),
            self.search.as_deref(),
            self.date.as_deref(),
        )
    }
}

/// One page of the flight board
pub async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<PageResponse>, ApiError> {
    let response = state.board.query_flights(&query.to_request()).await?;
    Ok(Json(response))
}

/// Raw stored fields of one flight
pub async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
) -> Result<Json<FlightEntry>, ApiError> {
    state
        .db
        .get_flight(flight_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(flight_id))
}

pub async fn create_flight(
    State(state): State<AppState>,
    Json(input): Json<FlightInput>,
) -> Result<(StatusCode, Json<MutationResult>), ApiError> {
    ensure_valid(&state.db, &input).await?;

    let flight_id = state.db.create_flight(&input).await?;
    info!(flight_id, "Flight created");

    Ok((
        StatusCode::CREATED,
        Json(MutationResult::new("Flight created", flight_id)),
    ))
}

/// Replace every field of a flight
pub async fn update_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
    Json(input): Json<FlightInput>,
) -> Result<Json<MutationResult>, ApiError> {
    if state.db.get_flight(flight_id).await?.is_none() {
        return Err(ApiError::NotFound(flight_id));
    }
    save(&state.db, flight_id, &input).await
}

/// Change only the fields present in the body
pub async fn patch_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
    Json(patch): Json<FlightPatch>,
) -> Result<Json<MutationResult>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::Validation(
            "Select at least one field to update.".to_string(),
        ));
    }

    let stored = state
        .db
        .get_flight(flight_id)
        .await?
        .ok_or(ApiError::NotFound(flight_id))?;

    let merged = patch.apply_to(&stored);
    save(&state.db, flight_id, &merged).await
}

pub async fn delete_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<i64>,
) -> Result<Json<MutationResult>, ApiError> {
    if !state.db.delete_flight(flight_id).await? {
        return Err(ApiError::NotFound(flight_id));
    }
    info!(flight_id, "Flight deleted");

    Ok(Json(MutationResult::new("Flight deleted", flight_id)))
}

pub async fn flights_options() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::ALLOW, "GET, POST, OPTIONS")])
}

pub async fn flight_options() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::ALLOW, "GET, PUT, PATCH, DELETE, OPTIONS")],
    )
}

// Helper functions

async fn ensure_valid(db: &Database, input: &FlightInput) -> Result<(), ApiError> {
    Ok(validate_flight(db, input).await?)
}

async fn save(
    db: &Database,
    flight_id: i64,
    input: &FlightInput,
) -> Result<Json<MutationResult>, ApiError> {
    ensure_valid(db, input).await?;

    if !db.update_flight(flight_id, input).await? {
        return Err(ApiError::NotFound(flight_id));
    }
    info!(flight_id, "Flight updated");

    Ok(Json(MutationResult::new("Flight updated", flight_id)))
}
