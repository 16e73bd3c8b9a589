use chrono::{DateTime, Duration, Utc};

use crate::models::FlightStatus;

/// Length of the boarding window that ends at departure
pub const BOARDING_WINDOW_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: FlightStatus,
    /// Position inside the boarding window, 0.0 before it opens, 1.0 from departure on
    pub progress: f64,
}

impl Classification {
    /// Used when the departure time is unknown
    pub fn fallback() -> Self {
        Self {
            status: FlightStatus::OnTime,
            progress: 0.0,
        }
    }
}

/// Classify a departure relative to `now`.
///
/// Any instant past departure counts as departed, however small the gap. Before
/// that, whole minutes are floored, so a departure 29m59s away is still boarding.
pub fn classify(departure: DateTime<Utc>, now: DateTime<Utc>) -> Classification {
    let status = if now > departure {
        FlightStatus::Departed
    } else if (departure - now).num_minutes() < BOARDING_WINDOW_MINUTES {
        FlightStatus::Boarding
    } else {
        FlightStatus::OnTime
    };

    let window = Duration::minutes(BOARDING_WINDOW_MINUTES);
    let boarding_start = departure - window;
    let elapsed_ms = (now - boarding_start).num_milliseconds() as f64;
    let progress = (elapsed_ms / window.num_milliseconds() as f64).clamp(0.0, 1.0);

    Classification { status, progress }
}
