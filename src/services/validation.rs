use crate::models::FlightInput;
use crate::services::time_codec::parse_utc;
use crate::services::Database;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The flight as submitted cannot be stored
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ValidationError {
    fn rejected(message: impl Into<String>) -> Self {
        ValidationError::Rejected(message.into())
    }
}

/// Check a flight as it would be stored, including the reference lookups.
pub async fn validate_flight(db: &Database, flight: &FlightInput) -> Result<(), ValidationError> {
    check_fields(flight).map_err(ValidationError::Rejected)?;

    let plane = db
        .get_plane(flight.plane_id)
        .await?
        .ok_or_else(|| ValidationError::rejected(format!("Unknown plane {}.", flight.plane_id)))?;
    if flight.passenger_count > plane.max_seats {
        return Err(ValidationError::rejected(format!(
            "Passenger count cannot exceed max seats ({}).",
            plane.max_seats
        )));
    }

    if !db.airline_exists(flight.airline_id).await? {
        return Err(ValidationError::rejected(format!(
            "Unknown airline {}.",
            flight.airline_id
        )));
    }
    for airport_id in [flight.origin_airport_id, flight.destination_airport_id] {
        if !db.airport_exists(airport_id).await? {
            return Err(ValidationError::rejected(format!("Unknown airport {airport_id}.")));
        }
    }

    Ok(())
}

/// Checks that need no lookups
fn check_fields(flight: &FlightInput) -> Result<(), String> {
    if flight.origin_airport_id == flight.destination_airport_id {
        return Err("Origin and destination must be different.".to_string());
    }
    if flight.gate.trim().is_empty() {
        return Err("Gate is required.".to_string());
    }
    if flight.passenger_count < 0 {
        return Err("Passenger count must be 0 or more.".to_string());
    }
    if flight.departure_time.trim().is_empty() {
        return Err("Departure time is required.".to_string());
    }
    if parse_utc(&flight.departure_time).is_none() {
        return Err(
            "Departure time must look like YYYY-MM-DDTHH:MM:SS (UTC) with no surrounding spaces."
                .to_string(),
        );
    }
    Ok(())
}
