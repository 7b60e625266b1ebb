//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! drawing into a frame.

mod alert;
mod chat;
mod input;
mod lobby;
mod login;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::{App, Screen};

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    match app.screen() {
        Screen::Login => login::render(frame, app, *main_area),
        Screen::Lobby => lobby::render(frame, app, *main_area),
        Screen::Chat => chat::render(frame, app, *main_area),
    }
    input::render(frame, app, *input_area);
    status::render(frame, app, *status_area);

    if let Some(text) = app.alert() {
        alert::render(frame, text, frame.area());
    }
}
