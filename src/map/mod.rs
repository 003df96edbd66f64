//! Interactive seat map engine.
//!
//! [`SeatMap`] owns the working seat list, its spatial index, the selection,
//! the hover state and the render loop for one viewer. Every mutation goes
//! through `&mut self`, so whoever owns the map serializes user input, live
//! updates and frames simply by owning it.

pub mod adjacency;
pub mod flatten;
pub mod keyboard;
pub mod pointer;
pub mod render;
pub mod spatial;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::MapConfig;
use crate::models::{InsertOutcome, Seat, SeatDelta, SelectionSet, Venue};

pub use adjacency::find_block;
pub use flatten::flatten;
pub use keyboard::{nearest_in_direction, Direction};
pub use pointer::{client_to_local, hit_test, HoverState, Point, Tooltip};
pub use render::{CommandSurface, RenderCommand, RenderLoop, Scene, Surface};
pub use spatial::SpatialIndex;

/// What a click or arrow key did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// The selection is full; nothing changed.
    LimitReached,
    /// The seat is sold, reserved or held.
    NotSelectable,
    /// No seat under the pointer or in that direction.
    Missed,
}

impl ToggleOutcome {
    pub fn changed(self) -> bool {
        matches!(self, ToggleOutcome::Selected | ToggleOutcome::Deselected)
    }
}

/// Informational message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    LimitReached { max: usize },
    #[serde(rename_all = "camelCase")]
    BlockFound { count: usize, seat_ids: Vec<String> },
    NoBlockFound { count: usize },
    Invalid { message: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::LimitReached { max } => format!("Max {max} seats allowed"),
            Notice::BlockFound { count, seat_ids } => format!(
                "Found block of {count} adjacent seats: {}",
                seat_ids.join(", ")
            ),
            Notice::NoBlockFound { count } => {
                format!("No block of {count} adjacent available seats found")
            }
            Notice::Invalid { message } => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionLine {
    pub id: String,
    pub label: String,
    pub price: f64,
}

/// Read model for the selection panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub count: usize,
    pub max: usize,
    pub seats: Vec<SelectionLine>,
    pub subtotal: f64,
}

impl SelectionSummary {
    pub fn of(selection: &SelectionSet) -> Self {
        Self {
            count: selection.len(),
            max: selection.max(),
            seats: selection
                .iter()
                .map(|s| SelectionLine {
                    id: s.id.clone(),
                    label: s.label(),
                    price: s.price,
                })
                .collect(),
            subtotal: selection.subtotal(),
        }
    }
}

pub struct SeatMap<S: Surface = CommandSurface> {
    venue: Arc<Venue>,
    config: MapConfig,
    seats: Vec<Seat>,
    positions: HashMap<String, usize>,
    index: SpatialIndex,
    selection: SelectionSet,
    hover: HoverState,
    heatmap: bool,
    canvas_origin: Point,
    render: RenderLoop<S>,
}

impl<S: Surface> SeatMap<S> {
    pub fn new(venue: Arc<Venue>, config: MapConfig) -> Self {
        let mut map = Self {
            selection: SelectionSet::new(config.max_selection),
            index: SpatialIndex::new(config.cell_size),
            venue: venue.clone(),
            config,
            seats: Vec::new(),
            positions: HashMap::new(),
            hover: HoverState::default(),
            heatmap: false,
            canvas_origin: Point::default(),
            render: RenderLoop::new(),
        };
        map.load_venue(venue);
        map
    }

    /// Replaces the venue: re-flattens, rebuilds the index and resizes the surface.
    /// Selected seats that no longer exist or are not available are dropped.
    pub fn load_venue(&mut self, venue: Arc<Venue>) {
        self.venue = venue;
        self.set_seats(flatten(&self.venue));
        let previous = std::mem::replace(&mut self.selection, SelectionSet::new(self.config.max_selection));
        self.restore_selection(previous.iter().cloned());
        let dpr = self.render.device_pixel_ratio();
        self.render.resize(self.venue.map, dpr);
        debug!(venue = %self.venue.venue_id, seats = self.seats.len(), "venue loaded into map");
    }

    /// Installs a new seat list. The spatial index is rebuilt from scratch.
    pub fn set_seats(&mut self, seats: Vec<Seat>) {
        self.index = SpatialIndex::build(self.config.cell_size, seats.iter().map(|s| (s.x, s.y)));
        self.positions = seats
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        self.seats = seats;
        self.hover.clear();
        self.render.mark_dirty();
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, id: &str) -> Option<&Seat> {
        self.positions.get(id).and_then(|&i| self.seats.get(i))
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary::of(&self.selection)
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn heatmap(&self) -> bool {
        self.heatmap
    }

    pub fn render_loop(&self) -> &RenderLoop<S> {
        &self.render
    }

    pub fn render_loop_mut(&mut self) -> &mut RenderLoop<S> {
        &mut self.render
    }

    /// Replaces the selection with the still-valid part of a saved snapshot.
    pub fn restore_selection<I>(&mut self, snapshot: I)
    where
        I: IntoIterator<Item = Seat>,
    {
        let seats = &self.seats;
        let positions = &self.positions;
        self.selection = SelectionSet::restore(self.config.max_selection, snapshot, |id| {
            positions.get(id).and_then(|&i| seats.get(i))
        });
        self.render.mark_dirty();
    }

    /// Seat under a map-local point, if one lies within the hit radius.
    pub fn hit_test(&self, local: Point) -> Option<&Seat> {
        hit_test(
            &self.seats,
            &self.index,
            local.x,
            local.y,
            self.config.hit_radius_sq(),
        )
        .and_then(|i| self.seats.get(i))
    }

    pub fn click(&mut self, client: Point) -> ToggleOutcome {
        let local = client_to_local(client, self.canvas_origin);
        let Some(seat) = self.hit_test(local).cloned() else {
            return ToggleOutcome::Missed;
        };
        self.toggle(&seat)
    }

    /// Pointer moved; returns the tooltip to show, if a seat is under the pointer.
    pub fn pointer_move(&mut self, client: Point) -> Option<Tooltip> {
        let local = client_to_local(client, self.canvas_origin);
        let hit = self.hit_test(local).cloned();
        let tooltip_at = client.offset(self.config.tooltip_offset);
        if self.hover.hover(hit.as_ref(), Some(tooltip_at)) {
            self.render.mark_dirty();
        }
        self.hover.tooltip()
    }

    pub fn pointer_leave(&mut self) {
        if self.hover.clear() {
            self.render.mark_dirty();
        }
    }

    /// Arrow-key navigation: toggles the nearest seat in `direction` from the
    /// most recently selected seat, or from the first seat when nothing is selected.
    pub fn navigate(&mut self, direction: Direction) -> ToggleOutcome {
        let current = match self.selection.last() {
            Some(last) => self.seat(&last.id),
            None => self.seats.first(),
        };
        let Some(current) = current else {
            return ToggleOutcome::Missed;
        };
        let Some(next) = nearest_in_direction(&self.seats, current, direction).cloned() else {
            return ToggleOutcome::Missed;
        };
        self.toggle(&next)
    }

    /// Click/keyboard toggle. An unavailable seat is left untouched even when it
    /// is already selected.
    fn toggle(&mut self, seat: &Seat) -> ToggleOutcome {
        let outcome = if !seat.status.is_selectable() {
            ToggleOutcome::NotSelectable
        } else if self.selection.remove(&seat.id).is_some() {
            ToggleOutcome::Deselected
        } else {
            match self.selection.insert(seat) {
                InsertOutcome::Inserted => ToggleOutcome::Selected,
                InsertOutcome::Full => ToggleOutcome::LimitReached,
                InsertOutcome::NotSelectable => ToggleOutcome::NotSelectable,
                // removal above makes this unreachable in practice
                InsertOutcome::AlreadyPresent => ToggleOutcome::Selected,
            }
        };
        if outcome.changed() {
            self.render.mark_dirty();
        }
        debug!(seat = %seat.id, ?outcome, selected = self.selection.len(), "toggle");
        outcome
    }

    /// Selects the cheapest block of `count` adjacent available seats, as far as
    /// the remaining capacity allows, and flashes its first seat.
    pub fn find_block(&mut self, count: usize, now: Instant) -> Notice {
        let Some(block) = find_block(&self.seats, count) else {
            return Notice::NoBlockFound { count };
        };

        for seat in &block {
            if self.selection.is_full() {
                break;
            }
            self.selection.insert(seat);
        }
        if let Some(first) = block.first() {
            self.hover.flash(first, now + self.config.flash_duration());
        }
        self.render.mark_dirty();

        Notice::BlockFound {
            count,
            seat_ids: block.into_iter().map(|s| s.id).collect(),
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.render.mark_dirty();
    }

    pub fn set_heatmap(&mut self, enabled: bool) {
        if self.heatmap != enabled {
            self.heatmap = enabled;
            self.render.mark_dirty();
        }
    }

    pub fn toggle_heatmap(&mut self) -> bool {
        self.set_heatmap(!self.heatmap);
        self.heatmap
    }

    /// Attaches a drawing surface whose top-left corner sits at `canvas_origin`
    /// in client coordinates.
    pub fn mount(&mut self, surface: S, canvas_origin: Point, device_pixel_ratio: f64) {
        self.canvas_origin = canvas_origin;
        self.render.mount(surface, self.venue.map, device_pixel_ratio);
    }

    pub fn unmount(&mut self) -> Option<S> {
        self.hover.clear();
        self.render.unmount()
    }

    pub fn resize(&mut self, device_pixel_ratio: f64, canvas_origin: Option<Point>) {
        if let Some(origin) = canvas_origin {
            self.canvas_origin = origin;
        }
        self.render.resize(self.venue.map, device_pixel_ratio);
    }

    /// Replaces one seat record with its new status. Selection membership is
    /// left alone even if the seat stops being available.
    pub fn apply_delta(&mut self, delta: &SeatDelta) -> bool {
        let Some(&i) = self.positions.get(&delta.seat_id) else {
            return false;
        };
        let updated = self.seats[i].with_status(delta.status);
        self.hover.refresh(&updated);
        self.seats[i] = updated;
        self.render.mark_dirty();
        true
    }

    /// Ends an elapsed block flash.
    pub fn expire_flash(&mut self, now: Instant) -> bool {
        let expired = self.hover.expire(now);
        if expired {
            self.render.mark_dirty();
        }
        expired
    }

    /// One frame tick. Returns whether anything was drawn.
    pub fn frame(&mut self) -> bool {
        let scene = Scene {
            map: self.venue.map,
            seats: &self.seats,
            selection: &self.selection,
            hover: self.hover.seat(),
            heatmap: self.heatmap,
        };
        self.render.frame(&scene)
    }
}
