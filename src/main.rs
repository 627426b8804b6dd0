//! warfish-turns: a terminal dashboard for Warfish games awaiting your turn.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollMsg   ┌──────────┐  draw()  ┌──────────┐
//! │ poll.rs  │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (thread) │  (channel) │ (state)  │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!                              ▲
//!                              │ handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! The tracker itself lives in the library crate; this binary is only the
//! host that turns its notifications into a screen.
//!
//! * **`app`**: dashboard state (counts, session, status line).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: parses args, loads config, starts polling, runs the loop.

mod app;
mod input;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;

use warfish_turns::poll::{self, channel_hooks};
use warfish_turns::{
    logging, Config, ConfigOverrides, FeedKind, HttpTransport, TrackerError, TurnCount,
    TurnTracker, UpdateOutcome,
};

use app::App;

/// Watch your Warfish games and see how many are waiting on you.
#[derive(Parser, Debug)]
#[command(name = "warfish-turns", version, about)]
struct Cli {
    /// TOML file with `rss_reference_url`, `login_url`, `polling_interval`
    /// and `session_cookie`.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Game list page that links to the feeds.
    #[arg(long, value_name = "URL")]
    reference_url: Option<String>,

    /// Login page shown when the session has expired.
    #[arg(long, value_name = "URL")]
    login_url: Option<String>,

    /// Milliseconds between polling cycles.
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    /// `Cookie` header copied from a logged-in browser session.
    #[arg(long, value_name = "COOKIE")]
    cookie: Option<String>,

    /// Print the turn and active counts once and exit.
    #[arg(long)]
    once: bool,

    /// Log file used by the dashboard.
    #[arg(long, value_name = "PATH", default_value = "warfish-turns.log")]
    log_file: PathBuf,

    /// Default log level; `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Overrides from the file (if any) with command-line flags on top.
    fn overrides(&self) -> Result<ConfigOverrides> {
        let base = match &self.config {
            Some(path) => ConfigOverrides::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConfigOverrides::default(),
        };

        let flags = ConfigOverrides {
            rss_reference_url: self.reference_url.clone(),
            login_url: self.login_url.clone(),
            polling_interval: self.interval,
            session_cookie: self.cookie.clone(),
            ..ConfigOverrides::default()
        };

        Ok(base.overlay(flags))
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides()?;

    if cli.once {
        logging::init_stderr(&cli.log_level);
        return run_once(Config::merged(overrides));
    }

    logging::init_file(&cli.log_file, &cli.log_level)?;
    run_dashboard(overrides)
}

/// Discover, count both feeds, print, exit.
fn run_once(config: Config) -> Result<()> {
    let login_url = config.login_url.clone();
    let transport = HttpTransport::from_config(&config)?;
    let tracker = TurnTracker::new(config, Box::new(transport));

    match tracker.try_discover_feed_urls() {
        Ok(_) => {}
        Err(TrackerError::NotLoggedIn { .. }) => {
            bail!("not logged in; log in at {login_url} and pass the session with --cookie")
        }
        Err(e) => return Err(e.into()),
    }

    let turn = tracker.try_games(FeedKind::Turn)?;
    let active = tracker.try_games(FeedKind::Active)?;

    println!("turn: {}", TurnCount::from_entries(turn.len()));
    println!("active: {}", TurnCount::from_entries(active.len()));
    Ok(())
}

fn run_dashboard(overrides: ConfigOverrides) -> Result<()> {
    install_panic_hook();

    // -- tracker + background polling ----------------------------------------
    let (overrides, rx) = channel_hooks(overrides);
    let config = Config::merged(overrides);
    let mut app = App::new(config.login_url.clone());

    let transport = HttpTransport::from_config(&config)?;
    let tracker = Arc::new(TurnTracker::new(config, Box::new(transport)));
    let _poller = poll::spawn(Arc::clone(&tracker));

    let (active_tx, active_rx) = mpsc::channel::<TurnCount>();

    // -- terminal setup (RAII: Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;

    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain notifications from the tracker.
    //   2. Start any work the user asked for.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Notifications
        while let Ok(msg) = rx.try_recv() {
            app.handle_poll(msg, chrono::Local::now());
        }
        while let Ok(count) = active_rx.try_recv() {
            app.set_active_count(count);
        }

        // 2. Requested work runs off the UI thread.
        if app.take_refresh() {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                if tracker.update_turn_count() == UpdateOutcome::Skipped {
                    debug!("manual refresh skipped; update already running");
                }
            });
        }
        if app.take_active() {
            let tracker = Arc::clone(&tracker);
            let tx = active_tx.clone();
            thread::spawn(move || {
                let _ = tx.send(tracker.get_active_games_count());
            });
        }

        // 3. Render
        guard.terminal.draw(|f| ui::draw(&app, f))?;

        // 4. Input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` restores the terminal, `_poller` stops the background thread.
    Ok(())
}
