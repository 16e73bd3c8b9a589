use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;

use crate::models::{
    Airline, Airport, Carrier, Endpoint, FlightEntry, FlightFilter, FlightInput, FlightRecord,
    Plane, SortKey,
};
use crate::services::repository::FlightRepository;
use crate::services::time_codec::format_utc;

const FLIGHT_ROW_SELECT: &str = r#"
    SELECT f.flightID, f.departureTime, f.passengerCount, f.gate,
           p.model AS plane, p.speed AS planeSpeed,
           al.name AS airlineName, al.logoPath AS airlineLogoPath,
           oc.name AS originCity, oa.code AS originCode,
           oa.latitude AS originLatitude, oa.longitude AS originLongitude,
           dc.name AS destinationCity, da.code AS destinationCode,
           da.latitude AS destinationLatitude, da.longitude AS destinationLongitude
"#;

const FLIGHT_JOINS: &str = r#"
    FROM Flight f
    JOIN Plane p ON p.planeID = f.planeID
    JOIN Airline al ON al.airlineID = f.airlineID
    JOIN Airport oa ON oa.airportID = f.originAirportID
    JOIN City oc ON oc.cityID = oa.cityID
    JOIN Airport da ON da.airportID = f.destinationAirportID
    JOIN City dc ON dc.cityID = da.cityID
"#;

/// Columns matched by the board's free-text search
const SEARCH_COLUMNS: [&str; 7] = [
    "al.name", "oc.name", "oa.code", "dc.name", "da.code", "f.gate", "p.model",
];

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the database file at `path`
    pub async fn new<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}", path.as_ref().display());
        Self::connect(&db_url, max_connections).await
    }

    /// Private in-memory database. Limited to one long-lived connection: every
    /// connection to `:memory:` gets its own empty database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(db_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database url: {db_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {db_url}"))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create the schema if it does not exist yet
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS City (
                cityID INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Airport (
                airportID INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                cityID INTEGER NOT NULL REFERENCES City(cityID),
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Airline (
                airlineID INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                logoPath TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Plane (
                planeID INTEGER PRIMARY KEY AUTOINCREMENT,
                model TEXT NOT NULL,
                maxSeats INTEGER NOT NULL CHECK (maxSeats >= 0),
                speed INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Flight (
                flightID INTEGER PRIMARY KEY AUTOINCREMENT,
                planeID INTEGER NOT NULL REFERENCES Plane(planeID),
                airlineID INTEGER NOT NULL REFERENCES Airline(airlineID),
                originAirportID INTEGER NOT NULL REFERENCES Airport(airportID),
                destinationAirportID INTEGER NOT NULL REFERENCES Airport(airportID),
                gate TEXT NOT NULL,
                passengerCount INTEGER NOT NULL CHECK (passengerCount >= 0),
                departureTime TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_flight_departure ON Flight(departureTime)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Load the demo data set when the flight and reference tables are all empty.
    /// Flight departures are laid out around `now` so a fresh board shows every
    /// status. Returns whether anything was inserted.
    pub async fn seed_if_empty(&self, now: DateTime<Utc>) -> Result<bool> {
        let existing: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM Flight) + (SELECT COUNT(*) FROM City)
                 + (SELECT COUNT(*) FROM Airport) + (SELECT COUNT(*) FROM Airline)
                 + (SELECT COUNT(*) FROM Plane)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        if existing > 0 {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        for (id, (code, city, latitude, longitude)) in (1i64..).zip(SEED_AIRPORTS) {
            sqlx::query("INSERT INTO City (cityID, name) VALUES (?, ?)")
                .bind(id)
                .bind(city)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT INTO Airport (airportID, code, cityID, latitude, longitude) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(code)
            .bind(id)
            .bind(latitude)
            .bind(longitude)
            .execute(&mut *tx)
            .await?;
        }

        for (id, (name, logo_path)) in (1i64..).zip(SEED_AIRLINES) {
            sqlx::query("INSERT INTO Airline (airlineID, name, logoPath) VALUES (?, ?, ?)")
                .bind(id)
                .bind(name)
                .bind(logo_path)
                .execute(&mut *tx)
                .await?;
        }

        for (id, (model, max_seats, speed)) in (1i64..).zip(SEED_PLANES) {
            sqlx::query("INSERT INTO Plane (planeID, model, maxSeats, speed) VALUES (?, ?, ?, ?)")
                .bind(id)
                .bind(model)
                .bind(max_seats)
                .bind(speed)
                .execute(&mut *tx)
                .await?;
        }

        for (plane, airline, origin, destination, gate, passengers, offset_minutes) in SEED_FLIGHTS {
            let departure = format_utc(now + Duration::minutes(offset_minutes));
            sqlx::query(
                r#"
                INSERT INTO Flight (planeID, airlineID, originAirportID, destinationAirportID, gate, passengerCount, departureTime)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(plane)
            .bind(airline)
            .bind(origin)
            .bind(destination)
            .bind(gate)
            .bind(passengers)
            .bind(departure)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    // Reference data
    pub async fn list_planes(&self) -> Result<Vec<Plane>> {
        let rows = sqlx::query("SELECT planeID, model, maxSeats, speed FROM Plane ORDER BY planeID")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_plane).collect()
    }

    pub async fn get_plane(&self, plane_id: i64) -> Result<Option<Plane>> {
        let row = sqlx::query("SELECT planeID, model, maxSeats, speed FROM Plane WHERE planeID = ?")
            .bind(plane_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_plane).transpose()
    }

    pub async fn list_airports(&self) -> Result<Vec<Airport>> {
        let rows = sqlx::query(
            r#"
            SELECT a.airportID, a.code, c.name AS city, a.latitude, a.longitude
            FROM Airport a JOIN City c ON c.cityID = a.cityID
            ORDER BY a.airportID
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut airports = Vec::new();
        for row in rows {
            airports.push(Airport {
                airport_id: row.try_get("airportID")?,
                code: row.try_get("code")?,
                city: row.try_get("city")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
            });
        }

        Ok(airports)
    }

    pub async fn airport_exists(&self, airport_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Airport WHERE airportID = ?")
            .bind(airport_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn list_airlines(&self) -> Result<Vec<Airline>> {
        let rows = sqlx::query("SELECT airlineID, name, logoPath FROM Airline ORDER BY airlineID")
            .fetch_all(&self.pool)
            .await?;

        let mut airlines = Vec::new();
        for row in rows {
            airlines.push(Airline {
                airline_id: row.try_get("airlineID")?,
                name: row.try_get("name")?,
                logo_path: row.try_get("logoPath")?,
            });
        }

        Ok(airlines)
    }

    pub async fn airline_exists(&self, airline_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Airline WHERE airlineID = ?")
            .bind(airline_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    // Flight operations
    pub async fn get_flight(&self, flight_id: i64) -> Result<Option<FlightEntry>> {
        let row = sqlx::query(
            "SELECT flightID, planeID, airlineID, originAirportID, destinationAirportID, gate, passengerCount, departureTime FROM Flight WHERE flightID = ?"
        )
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(FlightEntry {
                flight_id: row.try_get("flightID")?,
                plane_id: row.try_get("planeID")?,
                airline_id: row.try_get("airlineID")?,
                origin_airport_id: row.try_get("originAirportID")?,
                destination_airport_id: row.try_get("destinationAirportID")?,
                gate: row.try_get("gate")?,
                passenger_count: row.try_get("passengerCount")?,
                departure_time: row.try_get("departureTime")?,
            })),
            None => Ok(None),
        }
    }

    /// Insert a flight and return its new id
    pub async fn create_flight(&self, flight: &FlightInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO Flight (planeID, airlineID, originAirportID, destinationAirportID, gate, passengerCount, departureTime)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(flight.plane_id)
        .bind(flight.airline_id)
        .bind(flight.origin_airport_id)
        .bind(flight.destination_airport_id)
        .bind(&flight.gate)
        .bind(flight.passenger_count)
        .bind(&flight.departure_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replace every stored field. Returns false when the flight does not exist.
    pub async fn update_flight(&self, flight_id: i64, flight: &FlightInput) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE Flight
            SET planeID = ?, airlineID = ?, originAirportID = ?, destinationAirportID = ?,
                gate = ?, passengerCount = ?, departureTime = ?
            WHERE flightID = ?
            "#,
        )
        .bind(flight.plane_id)
        .bind(flight.airline_id)
        .bind(flight.origin_airport_id)
        .bind(flight.destination_airport_id)
        .bind(&flight.gate)
        .bind(flight.passenger_count)
        .bind(&flight.departure_time)
        .bind(flight_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when the flight does not exist
    pub async fn delete_flight(&self, flight_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM Flight WHERE flightID = ?")
            .bind(flight_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_plane(row: &SqliteRow) -> Result<Plane> {
        Ok(Plane {
            plane_id: row.try_get("planeID")?,
            model: row.try_get("model")?,
            max_seats: row.try_get("maxSeats")?,
            speed: row.try_get("speed")?,
        })
    }

    fn row_to_record(row: &SqliteRow) -> Result<FlightRecord> {
        Ok(FlightRecord {
            flight_id: row.try_get("flightID")?,
            departure_time: row.try_get("departureTime")?,
            passenger_count: row.try_get("passengerCount")?,
            gate: row.try_get("gate")?,
            plane: row.try_get("plane")?,
            plane_speed: row.try_get("planeSpeed")?,
            airline: Carrier {
                name: row.try_get("airlineName")?,
                logo_path: row.try_get("airlineLogoPath")?,
            },
            origin: Endpoint {
                city: row.try_get("originCity")?,
                code: row.try_get("originCode")?,
                latitude: row.try_get("originLatitude")?,
                longitude: row.try_get("originLongitude")?,
            },
            destination: Endpoint {
                city: row.try_get("destinationCity")?,
                code: row.try_get("destinationCode")?,
                latitude: row.try_get("destinationLatitude")?,
                longitude: row.try_get("destinationLongitude")?,
            },
        })
    }
}

/// Append the WHERE clause shared by the page and count queries
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &FlightFilter) {
    builder.push(" WHERE 1 = 1");

    if !filter.search.is_empty() {
        let pattern = format!("%{}%", escape_like(&filter.search.to_lowercase()));
        builder.push(" AND (");
        for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(format!("LOWER({column}) LIKE "));
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\'");
        }
        builder.push(")");
    }

    if let Some(date) = filter.date {
        builder.push(" AND substr(f.departureTime, 1, 10) = ");
        builder.push_bind(date.format("%Y-%m-%d").to_string());
    }
}

fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Gate => " ORDER BY f.gate ASC, f.departureTime ASC, f.flightID ASC",
        SortKey::Departure | SortKey::Status => " ORDER BY f.departureTime ASC, f.flightID ASC",
    }
}

/// Make `%`, `_` and `\` match literally inside a LIKE pattern
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl FlightRepository for Database {
    async fn get_page(
        &self,
        filter: &FlightFilter,
        sort: SortKey,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<FlightRecord>> {
        let offset = i64::try_from(offset).context("Page offset out of range")?;

        let mut builder = QueryBuilder::<Sqlite>::new(FLIGHT_ROW_SELECT);
        builder.push(FLIGHT_JOINS);
        push_filters(&mut builder, filter);
        builder.push(order_clause(sort));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to load flight page")?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn get_count(&self, filter: &FlightFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        builder.push(FLIGHT_JOINS);
        push_filters(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count flights")?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

// (code, city, latitude, longitude)
const SEED_AIRPORTS: [(&str, &str, f64, f64); 8] = [
    ("JFK", "New York", 40.6413, -73.7781),
    ("LHR", "London", 51.4700, -0.4543),
    ("CDG", "Paris", 49.0097, 2.5479),
    ("HND", "Tokyo", 35.5494, 139.7798),
    ("SYD", "Sydney", -33.9399, 151.1753),
    ("YYZ", "Toronto", 43.6777, -79.6248),
    ("DXB", "Dubai", 25.2532, 55.3657),
    ("FRA", "Frankfurt", 50.0379, 8.5622),
];

// (name, logo path)
const SEED_AIRLINES: [(&str, &str); 4] = [
    ("SkyBridge Airways", "/images/logos/skybridge.png"),
    ("Northwind Air", "/images/logos/northwind.png"),
    ("Pacific Crest", "/images/logos/pacific-crest.png"),
    ("Aurora Lines", "/images/logos/aurora.png"),
];

// (model, max seats, cruise speed km/h)
const SEED_PLANES: [(&str, i64, i64); 5] = [
    ("Airbus A320", 180, 840),
    ("Boeing 737-800", 189, 842),
    ("Boeing 787-9", 296, 903),
    ("Airbus A350-900", 325, 910),
    ("Embraer E190", 100, 829),
];

// (plane, airline, origin, destination, gate, passengers, minutes from now)
const SEED_FLIGHTS: [(i64, i64, i64, i64, &str, i64, i64); 12] = [
    (3, 1, 1, 2, "B22", 270, -95),
    (1, 2, 6, 1, "A4", 150, -20),
    (2, 4, 8, 3, "C7", 160, 6),
    (4, 3, 4, 5, "D1", 301, 14),
    (5, 2, 1, 6, "A9", 88, 27),
    (3, 4, 7, 2, "E12", 250, 45),
    (1, 1, 2, 3, "B3", 170, 80),
    (4, 1, 2, 4, "B18", 310, 140),
    (2, 2, 3, 8, "C2", 120, 210),
    (3, 3, 5, 7, "D5", 280, 330),
    (1, 4, 8, 2, "C11", 175, 1440),
    (5, 2, 6, 1, "A2", 95, 1500),
];
