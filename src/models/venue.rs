use serde::{Deserialize, Serialize};

use super::SeatStatus;

/// Venue document as delivered by the loader. Never mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub venue_id: String,
    pub name: String,
    pub map: MapSize,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    // Layout hint for the page, the engine works in map-local units only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<serde_json::Value>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub index: u32,
    #[serde(default)]
    pub seats: Vec<SourceSeat>,
}

/// Seat as it appears inside a row of the venue document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSeat {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub price: f64,
    #[serde(default = "default_tier")]
    pub price_tier: u8,
    #[serde(default)]
    pub status: Option<SeatStatus>,
}

fn default_tier() -> u8 {
    1
}

impl Venue {
    pub fn seat_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| r.seats.len())
            .sum()
    }
}
