pub mod commands;
pub mod config;
pub mod models;
pub mod services;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use commands::{
    create_flight, delete_flight, flight_options, flights_options, get_flight, list_airlines,
    list_airports, list_flights, list_planes, patch_flight, update_flight, AppState,
};
use config::AppConfig;
use services::{Database, SystemClock};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/flights", get(list_flights))
        .route(
            "/api/flights",
            get(list_flights).post(create_flight).options(flights_options),
        )
        .route(
            "/api/flights/{id}",
            get(get_flight)
                .put(update_flight)
                .patch(patch_flight)
                .delete(delete_flight)
                .options(flight_options),
        )
        .route("/api/planes", get(list_planes))
        .route("/api/airports", get(list_airports))
        .route("/api/airlines", get(list_airlines))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<()> {
    let db = Database::new(&config.database.path, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {:?}", config.database.path))?;
    info!("Opened database {:?}", config.database.path);

    if config.database.seed_demo_data && db.seed_if_empty(Utc::now()).await? {
        info!("Seeded demo flight data");
    }

    let state = AppState::new(Arc::new(db), Arc::new(SystemClock));
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("Flight board listening on {}", config.server.bind_address);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
