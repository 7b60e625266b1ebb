//! Login screen
//!
//! Shown while no identity is set. The input line below takes the username.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::App;

/// Render the login screen.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::bordered().title(" Parley ");

    let lines = vec![
        Line::from("Enter a username to log in"),
        Line::styled(format!("Server: {}", app.server()), Style::default().fg(Color::Gray)),
        Line::styled("Esc to quit", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
