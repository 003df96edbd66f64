use serde::Serialize;
use std::time::Instant;

use super::spatial::SpatialIndex;
use crate::models::Seat;

/// Default hit radius in map units.
pub const DEFAULT_HIT_RADIUS: f64 = 20.0;

/// A point in screen (client) or map-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: f64) -> Self {
        Self::new(self.x + by, self.y + by)
    }
}

/// Converts a client coordinate to map-local space given the canvas origin on screen.
pub fn client_to_local(client: Point, canvas_origin: Point) -> Point {
    Point::new(client.x - canvas_origin.x, client.y - canvas_origin.y)
}

/// Index of the seat nearest to `(x, y)` strictly within `radius_sq`.
///
/// Only seats from the 3x3 cell neighbourhood are considered. Equal distances
/// resolve to the smaller seat id so results are reproducible.
pub fn hit_test(
    seats: &[Seat],
    index: &SpatialIndex,
    x: f64,
    y: f64,
    radius_sq: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for i in index.query(x, y) {
        let Some(seat) = seats.get(i) else { continue };
        let d = seat.distance_sq(x, y);
        if d >= radius_sq {
            continue;
        }
        best = match best {
            Some((j, bd)) if bd < d || (bd == d && seats[j].id <= seat.id) => Some((j, bd)),
            _ => Some((i, d)),
        };
    }

    best.map(|(i, _)| i)
}

/// Tooltip read model for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub seat: Seat,
    pub left: f64,
    pub top: f64,
    pub text: String,
}

impl Tooltip {
    pub fn for_seat(seat: &Seat, position: Point) -> Self {
        Self {
            text: format!("{} • ₹{} • {}", seat.label(), seat.price, seat.status),
            seat: seat.clone(),
            left: position.x,
            top: position.y,
        }
    }
}

/// The seat under the pointer, if any, plus where its tooltip goes.
///
/// A hover may also be a timed flash (after a block search), which expires
/// on its own.
#[derive(Debug, Clone, Default)]
pub struct HoverState {
    seat: Option<Seat>,
    tooltip_at: Option<Point>,
    flash_until: Option<Instant>,
}

impl HoverState {
    pub fn seat(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        match (&self.seat, self.tooltip_at) {
            (Some(seat), Some(at)) => Some(Tooltip::for_seat(seat, at)),
            _ => None,
        }
    }

    pub fn flash_until(&self) -> Option<Instant> {
        self.flash_until
    }

    /// Sets the hover from a pointer move. Returns whether the hovered seat changed.
    pub fn hover(&mut self, seat: Option<&Seat>, tooltip_at: Option<Point>) -> bool {
        let changed = self.seat.as_ref().map(|s| &s.id) != seat.map(|s| &s.id);
        self.seat = seat.cloned();
        self.tooltip_at = seat.and(tooltip_at);
        self.flash_until = None;
        changed
    }

    pub fn flash(&mut self, seat: &Seat, until: Instant) {
        self.seat = Some(seat.clone());
        self.tooltip_at = None;
        self.flash_until = Some(until);
    }

    /// Clears an elapsed flash. Returns whether anything was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.flash_until {
            Some(until) if now >= until => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    /// Returns whether there was anything to clear.
    pub fn clear(&mut self) -> bool {
        let had = self.seat.is_some();
        self.seat = None;
        self.tooltip_at = None;
        self.flash_until = None;
        had
    }

    /// Keeps the hovered snapshot in step with a replaced seat record.
    pub fn refresh(&mut self, seat: &Seat) {
        if let Some(current) = self.seat.as_mut() {
            if current.id == seat.id {
                *current = seat.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatStatus;
    use std::time::Duration;

    fn seat(id: &str, x: f64, y: f64) -> Seat {
        Seat {
            id: id.to_string(),
            x,
            y,
            price: 10.0,
            price_tier: 1,
            section: "A".to_string(),
            row: 1,
            col: 1,
            status: SeatStatus::Available,
        }
    }

    fn indexed(seats: &[Seat]) -> SpatialIndex {
        SpatialIndex::build(48.0, seats.iter().map(|s| (s.x, s.y)))
    }

    #[test]
    fn picks_nearest_within_radius() {
        let seats = vec![seat("a", 100.0, 100.0), seat("b", 110.0, 100.0)];
        let index = indexed(&seats);
        assert_eq!(hit_test(&seats, &index, 108.0, 100.0, 400.0), Some(1));
        assert_eq!(hit_test(&seats, &index, 101.0, 100.0, 400.0), Some(0));
    }

    #[test]
    fn misses_outside_radius() {
        let seats = vec![seat("a", 100.0, 100.0)];
        let index = indexed(&seats);
        // exactly on the radius is a miss
        assert_eq!(hit_test(&seats, &index, 120.0, 100.0, 400.0), None);
        assert_eq!(hit_test(&seats, &index, 119.0, 100.0, 400.0), Some(0));
    }

    #[test]
    fn ties_go_to_smaller_id() {
        let seats = vec![seat("b", 90.0, 100.0), seat("a", 110.0, 100.0)];
        let index = indexed(&seats);
        assert_eq!(hit_test(&seats, &index, 100.0, 100.0, 400.0), Some(1));
    }

    #[test]
    fn client_coordinates_are_shifted_by_canvas_origin() {
        let local = client_to_local(Point::new(150.0, 90.0), Point::new(50.0, 40.0));
        assert_eq!(local, Point::new(100.0, 50.0));
    }

    #[test]
    fn flash_expires_after_deadline() {
        let start = Instant::now();
        let mut hover = HoverState::default();
        hover.flash(&seat("a", 0.0, 0.0), start + Duration::from_millis(1400));

        assert!(!hover.expire(start + Duration::from_millis(1399)));
        assert!(hover.seat().is_some());
        assert!(hover.expire(start + Duration::from_millis(1400)));
        assert!(hover.seat().is_none());
    }

    #[test]
    fn tooltip_only_exists_while_hovering() {
        let mut hover = HoverState::default();
        let s = seat("a", 0.0, 0.0);
        hover.hover(Some(&s), Some(Point::new(12.0, 12.0)));
        let tip = hover.tooltip().expect("tooltip while hovering");
        assert_eq!(tip.left, 12.0);
        assert!(tip.text.starts_with("Section A, Row 1, Seat 1"));

        hover.hover(None, Some(Point::new(0.0, 0.0)));
        assert!(hover.tooltip().is_none());
    }

    #[test]
    fn tooltip_serializes_screen_position() {
        let tip = Tooltip::for_seat(&seat("a", 0.0, 0.0), Point::new(40.0, 25.0));
        let json = serde_json::to_value(&tip).expect("tooltip serializes");
        assert_eq!(json["left"], 40.0);
        assert_eq!(json["top"], 25.0);
        assert_eq!(json["seat"]["priceTier"], 1);
    }
}
