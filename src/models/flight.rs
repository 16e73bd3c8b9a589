use serde::{Deserialize, Serialize};

/// One end of a route, joined from the airport and city tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub city: String,
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    #[serde(rename = "logo")]
    pub logo_path: String,
}

/// A flight as the repository hands it over: flat joined columns, no derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    #[serde(rename = "flightID")]
    pub flight_id: i64,
    /// Stored UTC text, possibly with fractional seconds and a trailing `Z`
    pub departure_time: String,
    pub passenger_count: i64,
    pub gate: String,
    pub plane: String,
    /// km/h, 0 when unknown
    pub plane_speed: i64,
    pub airline: Carrier,
    pub origin: Endpoint,
    pub destination: Endpoint,
}

/// Raw columns of the `Flight` table, as used by the maintenance endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightEntry {
    #[serde(rename = "flightID")]
    pub flight_id: i64,
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
