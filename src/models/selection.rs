
use super::Seat;

/// Default upper bound on how many seats one user may hold in a selection.
pub const DEFAULT_MAX_SELECTION: usize = 8;

/// Result of asking the selection to take a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
    Full,
    NotSelectable,
}

/// Seats the user picked, keyed by id, in insertion order.
///
/// The set never grows beyond `max` and never admits a seat that is not
/// available at insertion time. Members keep the snapshot taken on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    max: usize,
    seats: Vec<Seat>,
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SELECTION)
    }
}

impl SelectionSet {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            seats: Vec::with_capacity(max),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.max
    }

    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.seats.len())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seats.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    /// Most recently inserted member.
    pub fn last(&self) -> Option<&Seat> {
        self.seats.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub fn insert(&mut self, seat: &Seat) -> InsertOutcome {
        if self.contains(&seat.id) {
            return InsertOutcome::AlreadyPresent;
        }
        if !seat.status.is_selectable() {
            return InsertOutcome::NotSelectable;
        }
        if self.is_full() {
            return InsertOutcome::Full;
        }
        self.seats.push(seat.clone());
        InsertOutcome::Inserted
    }

    pub fn remove(&mut self, id: &str) -> Option<Seat> {
        let pos = self.seats.iter().position(|s| s.id == id)?;
        Some(self.seats.remove(pos))
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }

    pub fn subtotal(&self) -> f64 {
        self.seats.iter().map(|s| s.price).sum()
    }

    /// Rebuilds a set from an untrusted snapshot, keeping only what `resolve`
    /// confirms is a currently selectable seat and dropping anything past `max`.
    pub fn restore<'a, I, F>(max: usize, snapshot: I, mut resolve: F) -> Self
    where
        I: IntoIterator<Item = Seat>,
        F: FnMut(&str) -> Option<&'a Seat>,
    {
        let mut set = Self::new(max);
        for stale in snapshot {
            if let Some(current) = resolve(&stale.id) {
                set.insert(current);
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatStatus;

    fn seat(id: &str, price: f64, status: SeatStatus) -> Seat {
        Seat {
            id: id.to_string(),
            x: 0.0,
            y: 0.0,
            price,
            price_tier: 1,
            section: "A".to_string(),
            row: 1,
            col: 1,
            status,
        }
    }

    #[test]
    fn insert_respects_capacity() {
        let mut set = SelectionSet::new(2);
        assert_eq!(set.insert(&seat("a", 1.0, SeatStatus::Available)), InsertOutcome::Inserted);
        assert_eq!(set.insert(&seat("b", 1.0, SeatStatus::Available)), InsertOutcome::Inserted);
        assert_eq!(set.insert(&seat("c", 1.0, SeatStatus::Available)), InsertOutcome::Full);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unavailable_seats_are_refused() {
        let mut set = SelectionSet::default();
        for status in [SeatStatus::Sold, SeatStatus::Reserved, SeatStatus::Held] {
            assert_eq!(set.insert(&seat("x", 1.0, status)), InsertOutcome::NotSelectable);
        }
        assert!(set.is_empty());
    }

    #[test]
    fn last_tracks_insertion_order() {
        let mut set = SelectionSet::default();
        set.insert(&seat("a", 1.0, SeatStatus::Available));
        set.insert(&seat("b", 1.0, SeatStatus::Available));
        assert_eq!(set.last().map(|s| s.id.as_str()), Some("b"));
        set.remove("b");
        assert_eq!(set.last().map(|s| s.id.as_str()), Some("a"));
    }

    #[test]
    fn subtotal_sums_member_prices() {
        let mut set = SelectionSet::default();
        set.insert(&seat("a", 10.0, SeatStatus::Available));
        set.insert(&seat("b", 12.5, SeatStatus::Available));
        assert_eq!(set.subtotal(), 22.5);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut set = SelectionSet::default();
        set.insert(&seat("a", 10.0, SeatStatus::Available));
        set.clear();
        assert!(set.is_empty());
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn restore_drops_unknown_and_unavailable() {
        let known = vec![
            seat("a", 1.0, SeatStatus::Available),
            seat("b", 1.0, SeatStatus::Sold),
        ];
        let snapshot = vec![
            seat("a", 1.0, SeatStatus::Available),
            seat("b", 1.0, SeatStatus::Available),
            seat("ghost", 1.0, SeatStatus::Available),
        ];
        let set = SelectionSet::restore(8, snapshot, |id| known.iter().find(|s| s.id == id));
        assert_eq!(set.len(), 1);
        assert!(set.contains("a"));
    }

    #[test]
    fn restore_truncates_to_max_in_snapshot_order() {
        let known: Vec<Seat> = ["a", "b", "c"]
            .iter()
            .map(|id| seat(id, 1.0, SeatStatus::Available))
            .collect();
        let snapshot = known.iter().rev().cloned();
        let set = SelectionSet::restore(2, snapshot, |id| known.iter().find(|s| s.id == id));
        let ids: Vec<_> = set.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(set.is_full());
    }
}
