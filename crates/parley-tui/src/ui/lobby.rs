//! Lobby
//!
//! Logged in but not yet in a conversation. Lists the commands.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::App;

const COMMANDS: [(&str, &str); 4] = [
    ("/join <room>", "join or create a room"),
    ("/dm <user>", "start a private chat"),
    ("/logout", "log out"),
    ("/quit", "exit"),
];

/// Render the lobby.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.username().map_or_else(|| " Lobby ".to_string(), |name| format!(" {name} "));
    let block = Block::bordered().title(title);

    let lines: Vec<Line> = COMMANDS
        .iter()
        .map(|(command, help)| {
            Line::from(vec![
                Span::styled(
                    format!("{command:<14}"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(*help, Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
