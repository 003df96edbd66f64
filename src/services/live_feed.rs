//! Simulated live seat-availability feed.
//!
//! Stands in for a push subscription: on a fixed interval one seat, drawn
//! uniformly, gets a status drawn uniformly from all statuses. Deltas are
//! published on a channel, the receiving side owns the seat list and is the
//! only place they are applied.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::models::{SeatDelta, SeatStatus};

pub struct LiveFeed<R = StdRng> {
    seat_ids: Arc<[String]>,
    rng: R,
}

impl LiveFeed<StdRng> {
    /// A fixed `seed` makes the sequence of deltas reproducible.
    pub fn new(seat_ids: Vec<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(seat_ids, rng)
    }
}

impl<R: Rng> LiveFeed<R> {
    pub fn with_rng(seat_ids: Vec<String>, rng: R) -> Self {
        Self {
            seat_ids: seat_ids.into(),
            rng,
        }
    }

    pub fn seat_count(&self) -> usize {
        self.seat_ids.len()
    }

    /// One simulated update; `None` when there are no seats to touch.
    pub fn tick(&mut self) -> Option<SeatDelta> {
        if self.seat_ids.is_empty() {
            return None;
        }
        let seat = self.rng.gen_range(0..self.seat_ids.len());
        let status = SeatStatus::ALL[self.rng.gen_range(0..SeatStatus::ALL.len())];
        Some(SeatDelta {
            seat_id: self.seat_ids[seat].clone(),
            status,
        })
    }
}

/// Running feed task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct LiveFeedHandle {
    task: JoinHandle<()>,
}

impl LiveFeedHandle {
    /// Aborts the task and waits until it has actually ended.
    pub async fn stop(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveFeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts publishing one delta per `period` into `tx`. The first delta comes one
/// full period after the start. The task ends on its own once the receiver is gone.
pub fn spawn<R>(mut feed: LiveFeed<R>, period: Duration, tx: mpsc::Sender<SeatDelta>) -> LiveFeedHandle
where
    R: Rng + Send + 'static,
{
    let task = tokio::spawn(async move {
        info!("📡 Live feed started: {} seats, every {:?}", feed.seat_count(), period);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(delta) = feed.tick() else { continue };
            debug!(seat = %delta.seat_id, status = %delta.status, "live delta");
            if tx.send(delta).await.is_err() {
                break;
            }
        }
        info!("📡 Live feed stopped");
    });

    LiveFeedHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{i}")).collect()
    }

    #[test]
    fn tick_touches_exactly_one_known_seat() {
        let mut feed = LiveFeed::new(ids(50), Some(7));
        for _ in 0..200 {
            let delta = feed.tick().expect("non-empty feed always yields");
            assert!(delta.seat_id.starts_with('s'));
        }
    }

    #[test]
    fn empty_feed_never_yields() {
        let mut feed = LiveFeed::new(Vec::new(), Some(7));
        assert!(feed.tick().is_none());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = LiveFeed::new(ids(20), Some(42));
        let mut b = LiveFeed::new(ids(20), Some(42));
        for _ in 0..20 {
            assert_eq!(a.tick(), b.tick());
        }
    }

    #[test]
    fn draws_every_status_eventually() {
        let mut feed = LiveFeed::new(ids(3), Some(1));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            if let Some(d) = feed.tick() {
                seen.insert(d.status);
            }
        }
        assert_eq!(seen.len(), SeatStatus::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_one_delta_per_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn(LiveFeed::new(ids(10), Some(3)), Duration::from_millis(800), tx);

        tokio::time::sleep(Duration::from_millis(799)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());

        handle.stop().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_closes_the_channel() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn(LiveFeed::new(ids(10), None), Duration::from_millis(800), tx);
        drop(handle);
        // the aborted task drops its sender
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ends_on_its_own_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(16);
        let handle = spawn(LiveFeed::new(ids(10), Some(5)), Duration::from_millis(800), tx);
        drop(rx);

        tokio::time::sleep(Duration::from_millis(801)).await;
        tokio::task::yield_now().await;
        assert!(handle.is_finished());
    }
}
