const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points given in degrees, in kilometers
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Flight time in whole minutes, rounded up. An unknown speed (<= 0) yields 0.
pub fn duration_minutes(distance_km: f64, speed_kmh: i64) -> i64 {
    if speed_kmh <= 0 {
        return 0;
    }
    let hours = distance_km / speed_kmh as f64;
    ((hours * 60.0).ceil() as i64).max(0)
}

/// "6h 11m"
pub fn format_duration(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
