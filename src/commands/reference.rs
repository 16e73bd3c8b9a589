use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;
use super::flights::AppState;
use crate::models::{Airline, Airport, Plane};

#[derive(Debug, Serialize)]
pub struct PlaneList {
    pub planes: Vec<Plane>,
}

#[derive(Debug, Serialize)]
pub struct AirportList {
    pub airports: Vec<Airport>,
}

#[derive(Debug, Serialize)]
pub struct AirlineList {
    pub airlines: Vec<Airline>,
}

/// List all planes
pub async fn list_planes(State(state): State<AppState>) -> Result<Json<PlaneList>, ApiError> {
    let planes = state.db.list_planes().await?;
    Ok(Json(PlaneList { planes }))
}

/// List all airports with their city
pub async fn list_airports(State(state): State<AppState>) -> Result<Json<AirportList>, ApiError> {
    let airports = state.db.list_airports().await?;
    Ok(Json(AirportList { airports }))
}

/// List all airlines
pub async fn list_airlines(State(state): State<AppState>) -> Result<Json<AirlineList>, ApiError> {
    let airlines = state.db.list_airlines().await?;
    Ok(Json(AirlineList { airlines }))
}
