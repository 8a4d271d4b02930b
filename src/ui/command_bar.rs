use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputIntent};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    if !app.input_active {
        return;
    }

    let title = match app.input_intent {
        InputIntent::Filter => " Filter ",
        InputIntent::NewComment => " New Comment ",
        InputIntent::Reply(_) => " Reply ",
        InputIntent::EditComment(_) => " Edit Comment ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ratatui::style::Color::Yellow))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (scroll, cursor_col) = cursor_layout(&app.input_buffer, app.input_cursor, inner_width);

    let paragraph = Paragraph::new(Line::from(Span::raw(app.input_buffer.clone())))
        .block(block)
        .scroll((0, scroll as u16));
    f.render_widget(paragraph, area);

    let x = area.x + 1 + cursor_col as u16;
    let y = area.y + 1;
    f.set_cursor_position((x.min(area.x + area.width.saturating_sub(2)), y));
}

/// Horizontal scroll offset and on-screen cursor column for an input window
/// `width` display columns wide. Wide characters count their rendered width,
/// and the window scrolls so the cursor never leaves it.
fn cursor_layout(buffer: &str, cursor: usize, width: usize) -> (usize, usize) {
    let before: String = buffer.chars().take(cursor).collect();
    let col = Span::raw(before).width();
    let scroll = col.saturating_sub(width.saturating_sub(1));
    (scroll, col - scroll)
}
