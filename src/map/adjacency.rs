use std::collections::BTreeMap;

use crate::models::{Seat, SeatStatus};

/// Finds the cheapest run of `n` contiguous available seats in one row.
///
/// Seats are grouped by (section, row) and ordered by column; every window of
/// width `n` whose seats are all available is a candidate, and the one with the
/// lowest price sum wins. Groups are visited in (section, row) order and
/// windows left to right, the first minimum found is kept.
pub fn find_block(seats: &[Seat], n: usize) -> Option<Vec<Seat>> {
    if n == 0 {
        return None;
    }

    let mut rows: BTreeMap<(&str, u32), Vec<&Seat>> = BTreeMap::new();
    for seat in seats {
        rows.entry((seat.section.as_str(), seat.row))
            .or_default()
            .push(seat);
    }

    for row in rows.values_mut() {
        row.sort_by_key(|s| s.col);
    }

    let mut best: Option<(&[&Seat], f64)> = None;

    for row in rows.values() {
        for window in row.windows(n) {
            if !window.iter().all(|s| s.status == SeatStatus::Available) {
                continue;
            }
            let price: f64 = window.iter().map(|s| s.price).sum();
            if best.map_or(true, |(_, best_price)| price < best_price) {
                best = Some((window, price));
            }
        }
    }

    best.map(|(window, _)| window.iter().map(|s| (*s).clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(section: &str, row: u32, col: u32, price: f64, status: SeatStatus) -> Seat {
        Seat {
            id: format!("{section}-{row}-{col}"),
            x: col as f64 * 20.0,
            y: row as f64 * 20.0,
            price,
            price_tier: 1,
            section: section.to_string(),
            row,
            col,
            status,
        }
    }

    fn row_of(prices: &[f64], statuses: &[SeatStatus]) -> Vec<Seat> {
        prices
            .iter()
            .zip(statuses)
            .enumerate()
            .map(|(i, (p, s))| seat("A", 1, i as u32 + 1, *p, *s))
            .collect()
    }

    use SeatStatus::{Available as A, Sold as S};

    #[test]
    fn picks_cheapest_window_skipping_sold_seats() {
        let seats = row_of(&[10.0, 12.0, 99.0, 8.0, 9.0], &[A, A, S, A, A]);
        let block = find_block(&seats, 2).expect("block");
        let cols: Vec<u32> = block.iter().map(|s| s.col).collect();
        assert_eq!(cols, vec![4, 5]);
    }

    #[test]
    fn no_block_when_row_too_fragmented() {
        let seats = row_of(&[10.0, 12.0, 99.0, 8.0], &[A, S, A, S]);
        assert!(find_block(&seats, 2).is_none());
        assert!(find_block(&seats, 1).is_some());
    }

    #[test]
    fn zero_size_finds_nothing() {
        let seats = row_of(&[10.0], &[A]);
        assert!(find_block(&seats, 0).is_none());
    }

    #[test]
    fn never_spans_rows_or_sections() {
        let seats = vec![
            seat("A", 1, 1, 1.0, A),
            seat("A", 2, 2, 1.0, A),
            seat("B", 1, 2, 1.0, A),
        ];
        assert!(find_block(&seats, 2).is_none());
    }

    #[test]
    fn orders_by_column_not_list_position() {
        let seats = vec![
            seat("A", 1, 3, 5.0, A),
            seat("A", 1, 1, 5.0, A),
            seat("A", 1, 2, 50.0, S),
        ];
        assert!(find_block(&seats, 2).is_none());
    }

    #[test]
    fn equal_prices_keep_first_window() {
        let seats = row_of(&[5.0, 5.0, 5.0, 5.0], &[A, A, A, A]);
        let block = find_block(&seats, 2).expect("block");
        assert_eq!(block[0].col, 1);
    }
}
