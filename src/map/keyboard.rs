use serde::{Deserialize, Serialize};

use crate::models::Seat;

/// Arrow-key direction in map space (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Maps a DOM-style key name (`ArrowLeft`, ...) to a direction.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }

    fn admits(self, dx: f64, dy: f64) -> bool {
        match self {
            Direction::Left => dx < 0.0,
            Direction::Right => dx > 0.0,
            Direction::Up => dy < 0.0,
            Direction::Down => dy > 0.0,
        }
    }
}

/// Greedy directional neighbour of `current`.
///
/// Any seat lying strictly on the pressed side along the direction's axis is a
/// candidate; the one with the smallest Manhattan distance wins, first in list
/// order on ties. Off-axis seats can beat a seat further along the same row.
pub fn nearest_in_direction<'a>(
    seats: &'a [Seat],
    current: &Seat,
    direction: Direction,
) -> Option<&'a Seat> {
    let mut best: Option<(&Seat, f64)> = None;

    for seat in seats {
        if seat.id == current.id {
            continue;
        }
        let dx = seat.x - current.x;
        let dy = seat.y - current.y;
        if !direction.admits(dx, dy) {
            continue;
        }
        let score = dx.abs() + dy.abs();
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((seat, score));
        }
    }

    best.map(|(seat, _)| seat)
}
