use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{BoardFlight, DerivedFields, FlightRecord, PageRequest, PageResponse, SortKey};
use crate::services::clock::Clock;
use crate::services::geo;
use crate::services::repository::FlightRepository;
use crate::services::status::{classify, Classification};
use crate::services::time_codec::{format_utc, parse_utc};

/// Builds board pages: one repository page, enriched with time-dependent state.
#[derive(Clone)]
pub struct FlightQueryPipeline {
    repository: Arc<dyn FlightRepository>,
    clock: Arc<dyn Clock>,
}

impl FlightQueryPipeline {
    pub fn new(repository: Arc<dyn FlightRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn query_flights(&self, request: &PageRequest) -> Result<PageResponse> {
        let page = request.page.max(1);
        let size = request.size;
        let offset = request.offset();

        let records = self
            .repository
            .get_page(&request.filter, request.sort, size, offset)
            .await?;

        // One reference instant for the whole page
        let now = self.clock.now();
        let mut flights: Vec<BoardFlight> = records
            .into_iter()
            .map(|record| enrich(record, now))
            .collect();

        if request.sort == SortKey::Status {
            // Stable, and only within this page
            flights.sort_by_key(|flight| flight.derived.status.priority());
        }

        let total = self.repository.get_count(&request.filter).await?;
        let total_pages = if size == 0 {
            0
        } else {
            total.div_ceil(u64::from(size))
        };

        debug!(
            page,
            sort = request.sort.as_str(),
            search = %request.filter.search,
            date = ?request.filter.date,
            rows = flights.len(),
            total,
            "Built flight board page"
        );

        Ok(PageResponse {
            page,
            size,
            total,
            total_pages,
            flights,
        })
    }
}

fn enrich(record: FlightRecord, now: DateTime<Utc>) -> BoardFlight {
    let derived = derive_fields(&record, now);
    BoardFlight { record, derived }
}

/// Request-time fields of one flight. Deterministic in `(record, now)`.
///
/// An unparseable departure time does not fail the row: arrival is left empty and
/// the flight is reported on time with no boarding progress.
pub fn derive_fields(record: &FlightRecord, now: DateTime<Utc>) -> DerivedFields {
    let distance_km = geo::distance_km(
        record.origin.latitude,
        record.origin.longitude,
        record.destination.latitude,
        record.destination.longitude,
    );
    let duration_minutes = geo::duration_minutes(distance_km, record.plane_speed);

    let departure = parse_utc(&record.departure_time);
    if departure.is_none() {
        warn!(
            flight_id = record.flight_id,
            departure_time = %record.departure_time,
            "Unparseable departure time, using default status"
        );
    }

    let arrival_time = departure
        .map(|dep| format_utc(dep + Duration::minutes(duration_minutes)))
        .unwrap_or_default();
    let Classification { status, progress } = departure
        .map(|dep| classify(dep, now))
        .unwrap_or_else(Classification::fallback);

    DerivedFields {
        status,
        progress,
        distance_km,
        duration_minutes,
        duration_text: geo::format_duration(duration_minutes),
        arrival_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Carrier, Endpoint, FlightFilter, FlightStatus, PAGE_SIZE};
    use crate::services::clock::FixedClock;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed row set with the same filter/order contract as the database
    struct MemoryRepository {
        records: Vec<FlightRecord>,
        pages_requested: Mutex<Vec<(SortKey, u32, u64)>>,
        fail: bool,
    }

    impl MemoryRepository {
        fn new(records: Vec<FlightRecord>) -> Self {
            Self {
                records,
                pages_requested: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn matching(&self, filter: &FlightFilter) -> Vec<FlightRecord> {
            let needle = filter.search.to_lowercase();
            self.records
                .iter()
                .filter(|r| needle.is_empty() || r.gate.to_lowercase().contains(&needle))
                .filter(|r| match filter.date {
                    Some(date) => r.departure_time.starts_with(&date.format("%Y-%m-%d").to_string()),
                    None => true,
                })
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl FlightRepository for MemoryRepository {
        async fn get_page(
            &self,
            filter: &FlightFilter,
            sort: SortKey,
            limit: u32,
            offset: u64,
        ) -> Result<Vec<FlightRecord>> {
            if self.fail {
                return Err(anyhow!("storage unavailable"));
            }
            self.pages_requested.lock().unwrap().push((sort, limit, offset));

            let mut rows = self.matching(filter);
            match sort {
                SortKey::Gate => rows.sort_by(|a, b| a.gate.cmp(&b.gate)),
                _ => rows.sort_by(|a, b| a.departure_time.cmp(&b.departure_time)),
            }
            Ok(rows
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn get_count(&self, filter: &FlightFilter) -> Result<u64> {
            Ok(self.matching(filter).len() as u64)
        }
    }

    struct CountingClock {
        now: DateTime<Utc>,
        calls: AtomicUsize,
    }

    impl Clock for CountingClock {
        fn now(&self) -> DateTime<Utc> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.now
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 11, 1, 0, 0).unwrap()
    }

    fn record(flight_id: i64, gate: &str, departure_time: &str) -> FlightRecord {
        FlightRecord {
            flight_id,
            departure_time: departure_time.to_string(),
            passenger_count: 120,
            gate: gate.to_string(),
            plane: "Boeing 787-9".to_string(),
            plane_speed: 900,
            airline: Carrier {
                name: "SkyBridge Airways".to_string(),
                logo_path: "/images/logos/skybridge.png".to_string(),
            },
            origin: Endpoint {
                city: "New York".to_string(),
                code: "JFK".to_string(),
                latitude: 40.0,
                longitude: -73.0,
            },
            destination: Endpoint {
                city: "London".to_string(),
                code: "LHR".to_string(),
                latitude: 51.5,
                longitude: -0.1,
            },
        }
    }

    fn pipeline(repository: MemoryRepository) -> FlightQueryPipeline {
        FlightQueryPipeline::new(Arc::new(repository), Arc::new(FixedClock(now())))
    }

    #[test]
    fn test_derived_fields_example() {
        let derived = derive_fields(&record(1, "B22", "2026-02-11T01:29:13Z"), now());

        assert!((derived.distance_km - 5555.7).abs() < 1.0);
        assert_eq!(derived.duration_minutes, 371);
        assert_eq!(derived.duration_text, "6h 11m");
        assert_eq!(derived.arrival_time, "2026-02-11T07:40:13Z");
        assert_eq!(derived.status, FlightStatus::Boarding);
        assert!(derived.progress > 0.0 && derived.progress < 0.05);
    }

    #[test]
    fn test_derived_fields_are_deterministic() {
        let flight = record(1, "B22", "2026-02-11T01:29:13.250Z");
        let first = serde_json::to_string(&derive_fields(&flight, now())).unwrap();
        let second = serde_json::to_string(&derive_fields(&flight, now())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_speed() {
        let mut flight = record(1, "B22", "2026-02-11T03:00:00");
        flight.plane_speed = 0;
        let derived = derive_fields(&flight, now());

        assert_eq!(derived.duration_minutes, 0);
        assert_eq!(derived.duration_text, "0h 0m");
        assert_eq!(derived.arrival_time, "2026-02-11T03:00:00Z");
    }

    #[tokio::test]
    async fn test_bad_departure_does_not_break_page() {
        let repository = MemoryRepository::new(vec![
            record(1, "A1", "2026-02-11T00:30:00Z"),
            record(2, "A2", "yesterday-ish"),
            record(3, "A3", "2026-02-11T01:10:00Z"),
        ]);
        let request = PageRequest::normalize(None, Some("departure"), None, None);
        let response = pipeline(repository).query_flights(&request).await.unwrap();

        assert_eq!(response.flights.len(), 3);
        let bad = response
            .flights
            .iter()
            .find(|f| f.record.flight_id == 2)
            .unwrap();
        assert_eq!(bad.derived.arrival_time, "");
        assert_eq!(bad.derived.status, FlightStatus::OnTime);
        assert_eq!(bad.derived.progress, 0.0);
        assert_eq!(bad.derived.duration_minutes, 371);
    }

    #[tokio::test]
    async fn test_status_sort_is_stable_and_page_local() {
        // Departure order: departed, departed, boarding, on time, boarding, on time
        let repository = MemoryRepository::new(vec![
            record(1, "G1", "2026-02-11T00:10:00Z"),
            record(2, "G2", "2026-02-11T00:20:00Z"),
            record(3, "G3", "2026-02-11T01:05:00Z"),
            record(4, "G4", "2026-02-11T02:00:00Z"),
            record(5, "G5", "2026-02-11T01:20:00Z"),
            record(6, "G6", "2026-02-11T03:00:00Z"),
        ]);
        let response = pipeline(repository)
            .query_flights(&PageRequest::default())
            .await
            .unwrap();

        let ids: Vec<i64> = response.flights.iter().map(|f| f.record.flight_id).collect();
        assert_eq!(ids, vec![3, 5, 4, 6, 1, 2]);
    }

    #[tokio::test]
    async fn test_departure_and_gate_keep_repository_order() {
        let records = vec![
            record(1, "C1", "2026-02-11T00:10:00Z"),
            record(2, "A1", "2026-02-11T05:00:00Z"),
            record(3, "B1", "2026-02-11T01:05:00Z"),
        ];

        let by_departure = pipeline(MemoryRepository::new(records.clone()))
            .query_flights(&PageRequest::normalize(None, Some("departure"), None, None))
            .await
            .unwrap();
        let ids: Vec<i64> = by_departure.flights.iter().map(|f| f.record.flight_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        let by_gate = pipeline(MemoryRepository::new(records))
            .query_flights(&PageRequest::normalize(None, Some("gate"), None, None))
            .await
            .unwrap();
        let ids: Vec<i64> = by_gate.flights.iter().map(|f| f.record.flight_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_pagination_envelope() {
        let records: Vec<FlightRecord> = (0..250)
            .map(|i| record(i, &format!("G{i:03}"), "2026-02-11T06:00:00Z"))
            .collect();
        let pipeline = pipeline(MemoryRepository::new(records));

        let response = pipeline
            .query_flights(&PageRequest::normalize(Some("3"), Some("gate"), None, None))
            .await
            .unwrap();
        assert_eq!(response.page, 3);
        assert_eq!(response.size, PAGE_SIZE);
        assert_eq!(response.total, 250);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.flights.len(), 50);
        assert_eq!(response.flights[0].record.gate, "G200");

        let beyond = pipeline
            .query_flights(&PageRequest::normalize(Some("9"), None, None, None))
            .await
            .unwrap();
        assert!(beyond.flights.is_empty());
        assert_eq!(beyond.total, 250);
        assert_eq!(beyond.total_pages, 3);
    }

    #[tokio::test]
    async fn test_request_forwarded_to_repository() {
        let repository = Arc::new(MemoryRepository::new(vec![
            record(1, "A1", "2026-02-11T03:00:00Z"),
            record(2, "B7", "2026-02-11T04:00:00Z"),
            record(3, "B8", "2026-02-12T04:00:00Z"),
        ]));
        let pipeline = FlightQueryPipeline::new(repository.clone(), Arc::new(FixedClock(now())));

        let request = PageRequest::normalize(Some("2"), Some("nonsense"), Some(" b "), Some("2026-02-11"));
        let response = pipeline.query_flights(&request).await.unwrap();

        assert_eq!(
            *repository.pages_requested.lock().unwrap(),
            vec![(SortKey::Status, PAGE_SIZE, 100)]
        );
        assert!(response.flights.is_empty());
        assert_eq!(response.total, 1);
        assert_eq!(response.total_pages, 1);

        // A hand-built page 0 reads the first page
        let zeroth = PageRequest {
            page: 0,
            ..PageRequest::default()
        };
        let response = pipeline.query_flights(&zeroth).await.unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(
            repository.pages_requested.lock().unwrap().last(),
            Some(&(SortKey::Status, PAGE_SIZE, 0))
        );
    }

    #[tokio::test]
    async fn test_empty_result() {
        let response = pipeline(MemoryRepository::new(Vec::new()))
            .query_flights(&PageRequest::default())
            .await
            .unwrap();

        assert_eq!(response.page, 1);
        assert_eq!(response.total, 0);
        assert_eq!(response.total_pages, 0);
        assert!(response.flights.is_empty());
    }

    #[tokio::test]
    async fn test_clock_read_once_per_page() {
        let clock = Arc::new(CountingClock {
            now: now(),
            calls: AtomicUsize::new(0),
        });
        let records = (0..40)
            .map(|i| record(i, "A1", "2026-02-11T01:15:00Z"))
            .collect();
        let pipeline = FlightQueryPipeline::new(Arc::new(MemoryRepository::new(records)), clock.clone());

        let response = pipeline.query_flights(&PageRequest::default()).await.unwrap();
        assert_eq!(clock.calls.load(Ordering::SeqCst), 1);
        assert!(response
            .flights
            .windows(2)
            .all(|w| w[0].derived == w[1].derived));
    }

    #[tokio::test]
    async fn test_repository_failure_surfaces() {
        let mut repository = MemoryRepository::new(vec![record(1, "A1", "2026-02-11T03:00:00Z")]);
        repository.fail = true;

        let result = pipeline(repository).query_flights(&PageRequest::default()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_board_flight_json_shape() {
        let flight = record(1, "B22", "2026-02-11T01:29:13Z");
        let derived = derive_fields(&flight, now());
        let json = serde_json::to_value(BoardFlight { record: flight, derived }).unwrap();

        assert_eq!(json["flightID"], 1);
        assert_eq!(json["departureTime"], "2026-02-11T01:29:13Z");
        assert_eq!(json["planeSpeed"], 900);
        assert_eq!(json["airline"]["name"], "SkyBridge Airways");
        assert_eq!(json["origin"]["code"], "JFK");
        assert_eq!(json["status"]["class"], "boarding");
        assert_eq!(json["status"]["text"], "BOARDING");
        assert_eq!(json["durationMinutes"], 371);
        assert_eq!(json["durationText"], "6h 11m");
        assert_eq!(json["arrivalTime"], "2026-02-11T07:40:13Z");
        assert!(json["distanceKm"].is_number());
        assert!(json["progress"].is_number());
    }
}
