//! One viewer's interactive map session.
//!
//! A session task owns its [`SeatMap`] outright and `select!`s over inbound
//! commands, live-feed deltas, the frame interval and the block-flash deadline.
//! Each branch runs to completion before the next one is polled, so the seat
//! list and the selection are never observed half-updated. The transport
//! (WebSocket, tests) talks to the task through two channels.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::config::{LiveFeedConfig, MapConfig};
use crate::map::{
    CommandSurface, Direction, Notice, Point, RenderCommand, SeatMap, SelectionSummary,
    ToggleOutcome, Tooltip,
};
use crate::models::{MapSize, Venue};
use crate::services::live_feed::{self, LiveFeed};
use crate::services::selection_store::SelectionStore;

/// Typed replacement for the "how many adjacent seats?" prompt.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FindBlockRequest {
    #[validate(range(min = 1, message = "block size must be a positive number"))]
    pub count: i64,
}

/// Command from the viewer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    Mount { dpr: f64, origin_x: f64, origin_y: f64 },
    Unmount,
    #[serde(rename_all = "camelCase")]
    Resize {
        dpr: f64,
        origin_x: Option<f64>,
        origin_y: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Click { client_x: f64, client_y: f64 },
    #[serde(rename_all = "camelCase")]
    Move { client_x: f64, client_y: f64 },
    Leave,
    Key { key: String },
    FindBlock(FindBlockRequest),
    Clear,
    ToggleHeatmap,
}

/// Event for the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Ready {
        venue_id: String,
        name: String,
        map: MapSize,
        seat_count: usize,
        max_selection: usize,
    },
    Frame {
        width: u32,
        height: u32,
        scale: f64,
        commands: Vec<RenderCommand>,
    },
    Selection(SelectionSummary),
    Hover { tooltip: Option<Tooltip> },
    #[serde(rename_all = "camelCase")]
    Heatmap { enabled: bool },
    Notice { notice: Notice, message: String },
}

impl From<Notice> for ServerEvent {
    fn from(notice: Notice) -> Self {
        ServerEvent::Notice {
            message: notice.message(),
            notice,
        }
    }
}

/// Everything a session needs from the application.
#[derive(Clone)]
pub struct SessionContext {
    pub venue: Arc<Venue>,
    pub map: MapConfig,
    pub live_feed: LiveFeedConfig,
    pub store: Arc<dyn SelectionStore>,
    pub client_id: String,
}

/// The events channel closed; the viewer is gone.
struct Disconnected;

struct Session {
    map: SeatMap<CommandSurface>,
    store: Arc<dyn SelectionStore>,
    client_id: String,
    events: mpsc::Sender<ServerEvent>,
}

/// Runs a session until the command channel or the event channel closes.
/// Stops the frame interval and the live feed before returning.
pub async fn run_session(
    ctx: SessionContext,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::Sender<ServerEvent>,
) {
    let SessionContext { venue, map: map_config, live_feed: feed_config, store, client_id } = ctx;
    let frame_interval = map_config.frame_interval();

    let mut session = Session {
        map: SeatMap::new(venue.clone(), map_config),
        store,
        client_id,
        events,
    };
    info!("🎟️ Session {} opened for venue {}", session.client_id, venue.venue_id);

    if session.start().await.is_err() {
        return;
    }

    let (delta_tx, mut deltas) = mpsc::channel(64);
    let feed = feed_config.enabled.then(|| {
        let ids = session.map.seats().iter().map(|s| s.id.clone()).collect();
        live_feed::spawn(LiveFeed::new(ids, feed_config.seed), feed_config.interval(), delta_tx)
    });

    let mut frames = time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let flash_deadline = session.map.hover().flash_until().map(Instant::from_std);

        let step = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => session.handle(command).await,
                None => break,
            },
            Some(delta) = deltas.recv() => {
                session.map.apply_delta(&delta);
                Ok(())
            }
            _ = frames.tick() => session.frame().await,
            _ = sleep_until_opt(flash_deadline), if flash_deadline.is_some() => {
                session.expire_flash().await
            }
        };

        if step.is_err() {
            break;
        }
    }

    if let Some(feed) = feed {
        if feed.is_finished() {
            debug!("Live feed for {} had already stopped", session.client_id);
        }
        feed.stop().await;
    }
    info!("🎟️ Session {} closed", session.client_id);
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

impl Session {
    async fn emit(&self, event: impl Into<ServerEvent>) -> Result<(), Disconnected> {
        self.events.send(event.into()).await.map_err(|_| Disconnected)
    }

    async fn start(&mut self) -> Result<(), Disconnected> {
        let venue_id = self.map.venue().venue_id.clone();
        match self.store.load(&venue_id, &self.client_id).await {
            Ok(Some(saved)) => {
                let wanted = saved.seats.len();
                self.map.restore_selection(saved.seats);
                debug!(
                    "Restored {}/{} saved seats for {}",
                    self.map.selection().len(),
                    wanted,
                    self.client_id
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to restore selection for {}: {}", self.client_id, e),
        }

        let venue = self.map.venue();
        let ready = ServerEvent::Ready {
            venue_id: venue.venue_id.clone(),
            name: venue.name.clone(),
            map: venue.map,
            seat_count: self.map.seats().len(),
            max_selection: self.map.selection().max(),
        };
        self.emit(ready).await?;
        self.emit(ServerEvent::Selection(self.map.summary())).await
    }

    async fn handle(&mut self, command: ClientCommand) -> Result<(), Disconnected> {
        match command {
            ClientCommand::Mount { dpr, origin_x, origin_y } => {
                self.map.mount(CommandSurface::new(), Point::new(origin_x, origin_y), dpr);
                Ok(())
            }
            ClientCommand::Unmount => {
                self.map.unmount();
                Ok(())
            }
            ClientCommand::Resize { dpr, origin_x, origin_y } => {
                let origin = origin_x.zip(origin_y).map(|(x, y)| Point::new(x, y));
                self.map.resize(dpr, origin);
                Ok(())
            }
            ClientCommand::Click { client_x, client_y } => {
                let outcome = self.map.click(Point::new(client_x, client_y));
                if outcome == ToggleOutcome::LimitReached {
                    let max = self.map.selection().max();
                    self.emit(Notice::LimitReached { max }).await?;
                }
                self.after_toggle(outcome).await
            }
            ClientCommand::Move { client_x, client_y } => {
                let tooltip = self.map.pointer_move(Point::new(client_x, client_y));
                self.emit(ServerEvent::Hover { tooltip }).await
            }
            ClientCommand::Leave => {
                self.map.pointer_leave();
                self.emit(ServerEvent::Hover { tooltip: None }).await
            }
            ClientCommand::Key { key } => match Direction::from_key(&key) {
                Some(direction) => {
                    let outcome = self.map.navigate(direction);
                    self.after_toggle(outcome).await
                }
                None => Ok(()),
            },
            ClientCommand::FindBlock(request) => {
                if let Err(e) = request.validate() {
                    return self.emit(Notice::Invalid { message: e.to_string() }).await;
                }
                let count = usize::try_from(request.count).unwrap_or(usize::MAX);
                let notice = self.map.find_block(count, now());
                let found = matches!(notice, Notice::BlockFound { .. });
                info!("🔎 {} for {}", notice.message(), self.client_id);
                self.emit(notice).await?;
                if found {
                    self.selection_changed().await?;
                }
                Ok(())
            }
            ClientCommand::Clear => {
                self.map.clear_selection();
                self.selection_changed().await
            }
            ClientCommand::ToggleHeatmap => {
                let enabled = self.map.toggle_heatmap();
                self.emit(ServerEvent::Heatmap { enabled }).await
            }
        }
    }

    async fn after_toggle(&mut self, outcome: ToggleOutcome) -> Result<(), Disconnected> {
        if outcome.changed() {
            self.selection_changed().await
        } else {
            Ok(())
        }
    }

    /// Publishes the new selection and hands it to the store.
    async fn selection_changed(&mut self) -> Result<(), Disconnected> {
        let venue_id = &self.map.venue().venue_id;
        if let Err(e) = self
            .store
            .save(venue_id, &self.client_id, self.map.selection())
            .await
        {
            warn!("Failed to save selection for {}: {}", self.client_id, e);
        }
        self.emit(ServerEvent::Selection(self.map.summary())).await
    }

    async fn frame(&mut self) -> Result<(), Disconnected> {
        if !self.map.frame() {
            return Ok(());
        }
        let Some(surface) = self.map.render_loop_mut().surface_mut() else {
            return Ok(());
        };
        let (width, height) = surface.backing_size();
        let event = ServerEvent::Frame {
            width,
            height,
            scale: surface.scale(),
            commands: surface.take_commands(),
        };
        self.emit(event).await
    }

    async fn expire_flash(&mut self) -> Result<(), Disconnected> {
        if self.map.expire_flash(now()) {
            self.emit(ServerEvent::Hover { tooltip: None }).await?;
        }
        Ok(())
    }
}
