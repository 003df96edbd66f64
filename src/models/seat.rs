use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a single seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    #[default]
    Available,
    Sold,
    Reserved,
    Held,
}

impl SeatStatus {
    /// Every status, in the order the live feed draws from.
    pub const ALL: [SeatStatus; 4] = [
        SeatStatus::Available,
        SeatStatus::Sold,
        SeatStatus::Reserved,
        SeatStatus::Held,
    ];

    /// Only available seats may enter a selection.
    pub fn is_selectable(self) -> bool {
        self == SeatStatus::Available
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Sold => "sold",
            SeatStatus::Reserved => "reserved",
            SeatStatus::Held => "held",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened seat as the map engine works with it.
///
/// Seats are replaced, never edited: a status change produces a new record
/// with the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub price: f64,
    pub price_tier: u8,
    pub section: String,
    pub row: u32,
    /// 1-based position inside the row.
    pub col: u32,
    pub status: SeatStatus,
}

impl Seat {
    pub fn with_status(&self, status: SeatStatus) -> Seat {
        Seat {
            status,
            ..self.clone()
        }
    }

    /// Human label used by the selection panel and the tooltip.
    pub fn label(&self) -> String {
        format!("Section {}, Row {}, Seat {}", self.section, self.row, self.col)
    }

    pub fn distance_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// A single status change pushed by the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatDelta {
    pub seat_id: String,
    pub status: SeatStatus,
}
