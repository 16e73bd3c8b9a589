use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::FlightRecord;

/// Rows per board page. Not client-adjustable.
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Departure,
    Gate,
    #[default]
    Status,
}

impl SortKey {
    /// Anything other than `departure` or `gate` sorts by status.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("departure") => SortKey::Departure,
            Some("gate") => SortKey::Gate,
            _ => SortKey::Status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Departure => "departure",
            SortKey::Gate => "gate",
            SortKey::Status => "status",
        }
    }
}

/// Search and date filters, shared by the page query and the count query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    /// Trimmed; empty means no text filter
    pub search: String,
    pub date: Option<NaiveDate>,
}

impl FlightFilter {
    pub fn new(search: Option<&str>, date: Option<&str>) -> Self {
        Self {
            search: search.map(str::trim).unwrap_or_default().to_string(),
            date: date
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortKey,
    pub filter: FlightFilter,
}

impl PageRequest {
    /// Builds a request from untrusted query text. Bad values fall back to defaults, never fail.
    pub fn normalize(
        page: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
        date: Option<&str>,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1);

        Self {
            page,
            size: PAGE_SIZE,
            sort: SortKey::parse(sort),
            filter: FlightFilter::new(search, date),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::normalize(None, None, None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    Boarding,
    OnTime,
    Departed,
}

impl FlightStatus {
    pub fn class(&self) -> &'static str {
        match self {
            FlightStatus::Boarding => "boarding",
            FlightStatus::OnTime => "ontime",
            FlightStatus::Departed => "departed",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            FlightStatus::Boarding => "BOARDING",
            FlightStatus::OnTime => "ON TIME",
            FlightStatus::Departed => "DEPARTED",
        }
    }

    /// Board ordering when sorting by status: boarding first, departed last.
    pub fn priority(&self) -> u8 {
        match self {
            FlightStatus::Boarding => 0,
            FlightStatus::OnTime => 1,
            FlightStatus::Departed => 2,
        }
    }
}

impl Serialize for FlightStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FlightStatus", 2)?;
        state.serialize_field("class", self.class())?;
        state.serialize_field("text", self.text())?;
        state.end()
    }
}

/// Values computed at request time. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    pub status: FlightStatus,
    pub progress: f64,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub duration_text: String,
    /// Empty when the departure time could not be parsed
    pub arrival_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardFlight {
    #[serde(flatten)]
    pub record: FlightRecord,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub flights: Vec<BoardFlight>,
}
