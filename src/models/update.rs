use serde::{Deserialize, Serialize};

use super::FlightEntry;

/// Full flight body for create (POST) and replace (PUT).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInput {
    #[serde(rename = "planeID")]
    pub plane_id: i64,
    #[serde(rename = "airlineID")]
    pub airline_id: i64,
    #[serde(rename = "originAirportID")]
    pub origin_airport_id: i64,
    #[serde(rename = "destinationAirportID")]
    pub destination_airport_id: i64,
    pub gate: String,
    #[serde(rename = "passengerCount")]
    pub passenger_count: i64,
    #[serde(rename = "departureTime")]
    pub departure_time: String,
}

/// Partial update (PATCH). Each absent field keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPatch {
    #[serde(rename = "planeID", default)]
    pub plane_id: Option<i64>,
    #[serde(rename = "airlineID", default)]
    pub airline_id: Option<i64>,
    #[serde(rename = "originAirportID", default)]
    pub origin_airport_id: Option<i64>,
    #[serde(rename = "destinationAirportID", default)]
    pub destination_airport_id: Option<i64>,
    #[serde(default)]
    pub gate: Option<String>,
    #[serde(rename = "passengerCount", default)]
    pub passenger_count: Option<i64>,
    #[serde(rename = "departureTime", default)]
    pub departure_time: Option<String>,
}

impl FlightPatch {
    pub fn is_empty(&self) -> bool {
        *self == FlightPatch::default()
    }

    /// Overlays the present fields onto `stored`, producing the flight as it would be saved.
    pub fn apply_to(self, stored: &FlightEntry) -> FlightInput {
        FlightInput {
            plane_id: self.plane_id.unwrap_or(stored.plane_id),
            airline_id: self.airline_id.unwrap_or(stored.airline_id),
            origin_airport_id: self.origin_airport_id.unwrap_or(stored.origin_airport_id),
            destination_airport_id: self
                .destination_airport_id
                .unwrap_or(stored.destination_airport_id),
            gate: self.gate.unwrap_or_else(|| stored.gate.clone()),
            passenger_count: self.passenger_count.unwrap_or(stored.passenger_count),
            departure_time: self
                .departure_time
                .unwrap_or_else(|| stored.departure_time.clone()),
        }
    }
}

/// Body returned by the create, update and delete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub message: String,
    #[serde(rename = "flightID")]
    pub flight_id: i64,
}

impl MutationResult {
    pub fn new(message: &str, flight_id: i64) -> Self {
        Self {
            message: message.to_string(),
            flight_id,
        }
    }
}
