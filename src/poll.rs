//! Background polling.
//!
//! [`spawn`] is the explicit "start polling" step. It runs on a dedicated
//! thread so the caller never waits on the network: the thread discovers the
//! feed URLs, runs one update straight away, then one update per
//! `polling_interval` until the returned [`PollHandle`] is stopped or
//! dropped.
//!
//! Hosts that want to react on their own loop can build their hooks with
//! [`channel_hooks`], which forwards every notification as a [`PollMsg`].
//!
//! ## For contributors
//!
//! Ticks run sequentially on one thread, so they never overlap each other.
//! Manual refreshes from other threads are serialized by the tracker's own
//! single-flight latch, not here.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::config::ConfigOverrides;
use crate::discovery::FeedUrls;
use crate::tracker::{TurnCount, TurnTracker};

/// Notifications forwarded by [`channel_hooks`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PollMsg {
    /// Discovery succeeded.
    Ready(FeedUrls),
    /// Discovery found fewer than two feed links.
    NotLoggedIn,
    /// A network or missing-data failure.
    Error,
    /// A polling cycle finished with this count.
    TurnCount(TurnCount),
}

/// Replace every hook in `overrides` with one that sends a [`PollMsg`].
///
/// Sends to a dropped receiver are ignored.
pub fn channel_hooks(overrides: ConfigOverrides) -> (ConfigOverrides, mpsc::Receiver<PollMsg>) {
    let (tx, rx) = mpsc::channel();
    let (login_tx, error_tx, turn_tx, ready_tx) = (tx.clone(), tx.clone(), tx.clone(), tx);

    let overrides = overrides
        .on_not_logged_in(move || {
            let _ = login_tx.send(PollMsg::NotLoggedIn);
        })
        .on_error(move || {
            let _ = error_tx.send(PollMsg::Error);
        })
        .on_turn_update(move |count| {
            let _ = turn_tx.send(PollMsg::TurnCount(count));
        })
        .on_ready(move |urls| {
            let _ = ready_tx.send(PollMsg::Ready(urls.clone()));
        });

    (overrides, rx)
}

/// Owns the polling thread. Dropping it stops polling after the current
/// cycle without waiting; [`stop`](Self::stop) also joins the thread.
pub struct PollHandle {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PollHandle {
    /// Stop polling and wait for the thread to exit.
    ///
    /// Returns once any in-flight fetch has finished.
    pub fn stop(mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the interval wait.
        self.stop.take();
    }
}

/// Start polling `tracker` on a background thread.
pub fn spawn(tracker: Arc<TurnTracker>) -> PollHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let interval = tracker.config().polling_interval;

    let thread = thread::spawn(move || {
        info!(interval_ms = interval.as_millis() as u64, "poller started");

        if tracker.feed_urls().is_none() {
            tracker.discover_feed_urls();
        }

        loop {
            tracker.update_turn_count();

            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                // Explicit stop or handle dropped.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("poller stopped");
    });

    PollHandle {
        stop: Some(stop_tx),
        thread: Some(thread),
    }
}
