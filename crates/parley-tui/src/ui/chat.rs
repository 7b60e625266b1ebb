//! Chat area
//!
//! Displays the conversation's messages and who is typing.

use parley_app::{App, Conversation};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.conversation() {
        Some(Conversation::Room(room)) => format!(" #{room} "),
        Some(Conversation::Private(recipient)) => format!(" @{recipient} "),
        None => " No Conversation ".to_string(),
    };

    let mut block = Block::bordered().title(title);
    if !app.typing_status().is_empty() {
        block = block.title_bottom(Line::styled(
            format!(" {} ", app.typing_status()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = app.messages().len().saturating_sub(visible_height);

    let items: Vec<ListItem> = app
        .messages()
        .iter()
        .skip(skip)
        .map(|msg| {
            let style = if msg.is_own() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(msg.display_text().into_owned(), style))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
