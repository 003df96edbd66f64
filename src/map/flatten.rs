use crate::models::{Seat, Venue};

/// Turns the nested section/row/seat document into the flat working list.
///
/// Columns are assigned 1-based in document order within each row. A section
/// without a label is addressed by its id, a seat without a status starts
/// out available. The venue itself is left untouched.
pub fn flatten(venue: &Venue) -> Vec<Seat> {
    let mut seats = Vec::with_capacity(venue.seat_count());

    for section in &venue.sections {
        let section_label = section.label.as_deref().unwrap_or(&section.id);
        for row in &section.rows {
            for (i, source) in row.seats.iter().enumerate() {
                seats.push(Seat {
                    id: source.id.clone(),
                    x: source.x,
                    y: source.y,
                    price: source.price,
                    price_tier: source.price_tier,
                    section: section_label.to_string(),
                    row: row.index,
                    col: i as u32 + 1,
                    status: source.status.unwrap_or_default(),
                });
            }
        }
    }

    seats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MapSize, Row, SeatStatus, Section, SourceSeat};

    fn source(id: &str, x: f64, status: Option<SeatStatus>) -> SourceSeat {
        SourceSeat {
            id: id.to_string(),
            x,
            y: 10.0,
            price: 50.0,
            price_tier: 2,
            status,
        }
    }

    fn venue() -> Venue {
        Venue {
            venue_id: "v1".to_string(),
            name: "Hall".to_string(),
            map: MapSize { width: 400.0, height: 300.0 },
            sections: vec![
                Section {
                    id: "sec-a".to_string(),
                    label: Some("A".to_string()),
                    transform: None,
                    rows: vec![Row {
                        index: 3,
                        seats: vec![
                            source("a1", 10.0, None),
                            source("a2", 30.0, Some(SeatStatus::Sold)),
                        ],
                    }],
                },
                Section {
                    id: "sec-b".to_string(),
                    label: None,
                    transform: None,
                    rows: vec![Row {
                        index: 1,
                        seats: vec![source("b1", 100.0, None)],
                    }],
                },
            ],
        }
    }

    #[test]
    fn derives_section_row_and_column() {
        let seats = flatten(&venue());
        assert_eq!(seats.len(), 3);

        assert_eq!(seats[0].section, "A");
        assert_eq!(seats[0].row, 3);
        assert_eq!(seats[0].col, 1);
        assert_eq!(seats[1].col, 2);

        // unlabeled sections fall back to their id
        assert_eq!(seats[2].section, "sec-b");
        assert_eq!(seats[2].col, 1);
    }

    #[test]
    fn missing_status_defaults_to_available() {
        let seats = flatten(&venue());
        assert_eq!(seats[0].status, SeatStatus::Available);
        assert_eq!(seats[1].status, SeatStatus::Sold);
    }

    #[test]
    fn empty_venue_yields_empty_list() {
        let mut v = venue();
        v.sections.clear();
        assert!(flatten(&v).is_empty());

        let mut v = venue();
        v.sections[0].rows.clear();
        assert_eq!(flatten(&v).len(), 1);
    }

    #[test]
    fn flattening_twice_gives_equal_content() {
        let v = venue();
        assert_eq!(flatten(&v), flatten(&v));
    }
}
