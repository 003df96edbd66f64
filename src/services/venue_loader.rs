use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{MapError, MapResult};
use crate::models::Venue;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads the venue document from a `http(s)://` URL or a filesystem path.
///
/// Only the JSON shape is checked. An empty `sections` list is a valid venue.
pub async fn load_venue(source: &str) -> MapResult<Venue> {
    let venue = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_venue(source).await?
    } else {
        read_venue_file(source).await?
    };
    info!(
        "🏟️ Venue '{}' ({}) loaded from {}: {} seats",
        venue.name,
        venue.venue_id,
        source,
        venue.seat_count()
    );
    Ok(venue)
}

pub async fn fetch_venue(url: &str) -> MapResult<Venue> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(MapError::VenueLoad(format!(
            "{} answered with {}",
            url,
            response.status()
        )));
    }
    Ok(response.json::<Venue>().await?)
}

pub async fn read_venue_file(path: impl AsRef<Path>) -> MapResult<Venue> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MapError::VenueLoad(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&raw)?)
}
