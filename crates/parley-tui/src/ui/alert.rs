//! Modal alert
//!
//! Drawn over everything else until the next key press dismisses it.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Clear, Paragraph},
};

const MIN_WIDTH: u16 = 24;
const HEIGHT: u16 = 5;

/// Render `text` in a box centered on `area`.
pub fn render(frame: &mut Frame, text: &str, area: Rect) {
    let text_width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    let width = text_width.saturating_add(4).max(MIN_WIDTH).min(area.width);
    let height = HEIGHT.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::bordered()
        .title(" Login failed ")
        .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    let lines = vec![
        Line::from(text.to_string()),
        Line::default(),
        Line::styled("Press any key", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
