//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the counts panel on top and a one-line
//!   status bar at the bottom.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use warfish_turns::TurnCount;

use crate::app::{App, Session};

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_counts(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

fn count_text(count: Option<TurnCount>) -> String {
    count.map_or_else(|| "–".to_string(), |c| c.to_string())
}

fn turn_style(count: Option<TurnCount>) -> Style {
    let colour = match count {
        Some(TurnCount::Games(0)) => Color::Gray,
        Some(TurnCount::Games(_)) => Color::Green,
        Some(TurnCount::Error) => Color::Red,
        None => Color::DarkGray,
    };
    Style::default().fg(colour).add_modifier(Modifier::BOLD)
}

/// Render the turn and active counts, plus the login hint when needed.
fn draw_counts(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::raw("Your turn:     "),
            Span::styled(count_text(app.turn_count), turn_style(app.turn_count)),
        ]),
        Line::from(vec![
            Span::raw("Active games:  "),
            Span::styled(
                count_text(app.active_count),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::raw(""),
    ];

    match app.session {
        Session::NotLoggedIn => lines.push(Line::from(vec![
            Span::styled("Not logged in. Log in at ", Style::default().fg(Color::Red)),
            Span::styled(
                app.login_url.as_str(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
        ])),
        Session::Pending => lines.push(Line::styled(
            "Looking for your game feeds…",
            Style::default().fg(Color::DarkGray),
        )),
        Session::LoggedIn => {}
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" Warfish ")
            .borders(Borders::ALL),
    );
    frame.render_widget(panel, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let updated = app
        .last_update
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "not updated yet".into());

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(updated, Style::default().fg(Color::Green)),
    ];
    if app.errors > 0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} error(s)", app.errors),
            Style::default().fg(Color::Red),
        ));
    }
    spans.push(Span::raw("  q: quit  r: refresh  a: active"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use warfish_turns::poll::PollMsg;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(120, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();

        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_when_pending() {
        let app = App::new("http://warfish.net/war/login");
        let text = render(&app);
        assert!(text.contains("not updated yet"));
    }

    #[test]
    fn shows_turn_count() {
        let mut app = App::new("http://warfish.net/war/login");
        app.handle_poll(PollMsg::TurnCount(TurnCount::Games(4)), chrono::Local::now());
        assert!(render(&app).contains("Your turn:     4"));
    }

    #[test]
    fn shows_e_marker() {
        let mut app = App::new("http://warfish.net/war/login");
        app.handle_poll(PollMsg::TurnCount(TurnCount::Error), chrono::Local::now());
        assert!(render(&app).contains("Your turn:     E"));
    }

    #[test]
    fn not_logged_in_shows_login_url() {
        let mut app = App::new("http://warfish.net/war/login");
        app.handle_poll(PollMsg::NotLoggedIn, chrono::Local::now());
        assert!(render(&app).contains("http://warfish.net/war/login"));
    }

    #[test]
    fn errors_appear_in_status_bar() {
        let mut app = App::new("l");
        app.handle_poll(PollMsg::Error, chrono::Local::now());
        assert!(render(&app).contains("1 error(s)"));
    }
}
