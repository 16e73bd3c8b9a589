mod board;
mod flight;
mod reference;
mod update;

pub use board::{
    BoardFlight, DerivedFields, FlightFilter, FlightStatus, PageRequest, PageResponse, SortKey,
    PAGE_SIZE,
};
pub use flight::{Carrier, Endpoint, FlightEntry, FlightRecord};
pub use reference::{Airline, Airport, Plane};
pub use update::{FlightInput, FlightPatch, MutationResult};
