pub mod clock;
pub mod database;
pub mod geo;
pub mod pipeline;
pub mod repository;
pub mod status;
pub mod time_codec;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use database::Database;
pub use pipeline::FlightQueryPipeline;
pub use repository::FlightRepository;
