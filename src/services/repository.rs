use anyhow::Result;
use async_trait::async_trait;

use crate::models::{FlightFilter, FlightRecord, SortKey};

/// Read side of flight storage used by the board.
///
/// `get_page` and `get_count` must apply the same filter semantics so that page
/// counts agree with what paging returns.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// One page of joined flight rows. `Departure` and `Gate` are ordered by the
    /// store; `Status` gets departure order.
    async fn get_page(
        &self,
        filter: &FlightFilter,
        sort: SortKey,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<FlightRecord>>;

    async fn get_count(&self, filter: &FlightFilter) -> Result<u64>;
}
