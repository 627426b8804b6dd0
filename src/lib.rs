//! warfish-turns: reports how many Warfish games are waiting on your turn.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐ get_text ┌──────────────┐ links ┌──────────────┐
//! │  source/     │ ───────► │ discovery.rs │ ────► │  tracker.rs  │
//! │ (Transport)  │ get_feed │   (scrape)   │       │ (state+hooks)│
//! └──────────────┘ ───────────────────────────────►└──────────────┘
//!                                                       ▲
//!                                                       │ update_turn_count()
//!                                                  ┌──────────┐
//!                                                  │ poll.rs  │
//!                                                  │ (thread) │
//!                                                  └──────────┘
//! ```
//!
//! * **`config`**: defaults, partial overrides (TOML or code), and hooks.
//! * **`source/`**: the `Transport` trait and its HTTP implementation.
//! * **`discovery`**: finds the two feed links on the game list page.
//! * **`tracker`**: owns config and feed URLs; counts feeds; fires hooks.
//! * **`poll`**: runs discovery and the update cycle on a timer.
//! * **`logging`**: `tracing-subscriber` setup for the binary.
//!
//! ```no_run
//! use std::sync::Arc;
//! use warfish_turns::{poll, Config, ConfigOverrides, HttpTransport, TurnTracker};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::merged(
//!     ConfigOverrides::default()
//!         .polling_interval(30_000)
//!         .on_turn_update(|count| println!("your turn: {count}")),
//! );
//! let tracker = Arc::new(TurnTracker::new(config, Box::new(HttpTransport::new()?)));
//! let _handle = poll::spawn(tracker);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod poll;
pub mod source;
pub mod tracker;

pub use config::{Config, ConfigOverrides, Hooks};
pub use discovery::FeedUrls;
pub use error::{FeedKind, TrackerError};
pub use source::{FeedEntry, FeedResult, HttpTransport, Transport};
pub use tracker::{TurnCount, TurnTracker, UpdateOutcome};
