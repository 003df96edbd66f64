pub mod seat;
pub mod selection;
pub mod venue;

pub use seat::{Seat, SeatDelta, SeatStatus};
pub use selection::{InsertOutcome, SelectionSet, DEFAULT_MAX_SELECTION};
pub use venue::{MapSize, Row, Section, SourceSeat, Venue};
