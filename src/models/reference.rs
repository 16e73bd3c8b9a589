use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    #[serde(rename = "planeID")]
    pub plane_id: i64,
    pub model: String,
    #[serde(rename = "maxSeats")]
    pub max_seats: i64,
    /// km/h
    pub speed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    #[serde(rename = "airportID")]
    pub airport_id: i64,
    pub code: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    #[serde(rename = "airlineID")]
    pub airline_id: i64,
    pub name: String,
    #[serde(rename = "logo")]
    pub logo_path: String,
}
