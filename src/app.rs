use chrono::{DateTime, Local};

use warfish_turns::poll::PollMsg;
use warfish_turns::TurnCount;

/// What the dashboard knows about the player's session.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Session {
    /// Discovery has not finished yet.
    Pending,
    LoggedIn,
    NotLoggedIn,
}

pub struct App {
    /// Latest turn count; `None` until the first cycle finishes.
    pub turn_count: Option<TurnCount>,
    /// Active-games count, fetched on demand.
    pub active_count: Option<TurnCount>,
    pub session: Session,
    /// Shown when the session is not logged in.
    pub login_url: String,
    pub last_update: Option<DateTime<Local>>,
    /// Failures reported since start.
    pub errors: usize,
    /// Last status message.
    pub status: String,
    /// Whether the user has requested to quit.
    pub quit: bool,
    refresh_requested: bool,
    active_requested: bool,
}

impl App {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            turn_count: None,
            active_count: None,
            session: Session::Pending,
            login_url: login_url.into(),
            last_update: None,
            errors: 0,
            status: "Discovering feeds…".into(),
            quit: false,
            refresh_requested: false,
            active_requested: false,
        }
    }

    /// Apply one notification from the tracker.
    pub fn handle_poll(&mut self, msg: PollMsg, now: DateTime<Local>) {
        match msg {
            PollMsg::Ready(_) => {
                self.session = Session::LoggedIn;
                self.status = "Feeds found".into();
            }
            PollMsg::NotLoggedIn => {
                self.session = Session::NotLoggedIn;
                self.status = "Not logged in".into();
            }
            PollMsg::Error => {
                self.errors += 1;
                self.status = format!("Error in fetching data ({})", now.format("%H:%M:%S"));
            }
            PollMsg::TurnCount(count) => {
                self.turn_count = Some(count);
                self.last_update = Some(now);
                if !count.is_error() {
                    self.status = format!("{count} game(s) waiting");
                }
            }
        }
    }

    pub fn set_active_count(&mut self, count: TurnCount) {
        self.active_count = Some(count);
    }

    // -- requests from input -------------------------------------------------

    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
        self.status = "Refreshing…".into();
    }

    pub fn request_active(&mut self) {
        self.active_requested = true;
    }

    /// Returns and clears a pending refresh request.
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Returns and clears a pending active-count request.
    pub fn take_active(&mut self) -> bool {
        std::mem::take(&mut self.active_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use warfish_turns::FeedUrls;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn new_app_is_pending() {
        let app = App::new("http://warfish.net/war/login");
        assert_eq!(app.session, Session::Pending);
        assert!(app.turn_count.is_none());
        assert!(!app.quit);
        assert_eq!(app.errors, 0);
    }

    #[test]
    fn ready_marks_logged_in() {
        let mut app = App::new("l");
        app.handle_poll(
            PollMsg::Ready(FeedUrls {
                active: Some("a".into()),
                turn: Some("t".into()),
            }),
            now(),
        );
        assert_eq!(app.session, Session::LoggedIn);
    }

    #[test]
    fn not_logged_in_is_recorded() {
        let mut app = App::new("l");
        app.handle_poll(PollMsg::NotLoggedIn, now());
        assert_eq!(app.session, Session::NotLoggedIn);
        assert_eq!(app.status, "Not logged in");
    }

    #[test]
    fn turn_count_updates_timestamp() {
        let mut app = App::new("l");
        app.handle_poll(PollMsg::TurnCount(TurnCount::Games(3)), now());
        assert_eq!(app.turn_count, Some(TurnCount::Games(3)));
        assert_eq!(app.last_update, Some(now()));
        assert_eq!(app.status, "3 game(s) waiting");
    }

    #[test]
    fn error_then_e_keeps_error_status() {
        let mut app = App::new("l");
        app.handle_poll(PollMsg::Error, now());
        app.handle_poll(PollMsg::TurnCount(TurnCount::Error), now());

        assert_eq!(app.errors, 1);
        assert_eq!(app.turn_count, Some(TurnCount::Error));
        assert!(app.status.starts_with("Error in fetching data"));
    }

    #[test]
    fn requests_are_taken_once() {
        let mut app = App::new("l");
        app.request_refresh();
        app.request_active();

        assert!(app.take_refresh());
        assert!(!app.take_refresh());
        assert!(app.take_active());
        assert!(!app.take_active());
    }

    #[test]
    fn active_count_is_stored() {
        let mut app = App::new("l");
        app.set_active_count(TurnCount::Games(5));
        assert_eq!(app.active_count, Some(TurnCount::Games(5)));
    }
}
