use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::map::{flatten, render::LegendEntry, render::LEGEND};
use crate::models::{MapSize, Seat};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venue", get(get_venue))
        .route("/seats", get(get_seats))
        .route("/legend", get(get_legend))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueResponse {
    pub venue_id: String,
    pub name: String,
    pub map: MapSize,
    pub seat_count: usize,
    pub max_selection: usize,
}

// GET /api/venue
async fn get_venue(State(state): State<Arc<AppState>>) -> Json<VenueResponse> {
    let venue = &state.venue;
    Json(VenueResponse {
        venue_id: venue.venue_id.clone(),
        name: venue.name.clone(),
        map: venue.map,
        seat_count: venue.seat_count(),
        max_selection: state.config.map.max_selection,
    })
}

// GET /api/seats - исходная раскладка, без живых обновлений
async fn get_seats(State(state): State<Arc<AppState>>) -> Json<Vec<Seat>> {
    Json(flatten(&state.venue))
}

// GET /api/legend
async fn get_legend() -> Json<&'static [LegendEntry]> {
    Json(&LEGEND)
}
