use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, ViewMode};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();

    // A pending delete replaces everything with the confirm prompt.
    if app.pending_delete.is_some() {
        spans.push(Span::styled(
            " Delete this comment and its replies? y/n ",
            Style::default()
                .fg(ratatui::style::Color::Black)
                .bg(ratatui::style::Color::Red),
        ));
        f.render_widget(Paragraph::new(Line::from(spans)), area);
        return;
    }

    match app.view_mode {
        ViewMode::Board => {
            spans.push(hint("↑↓←→", "navigate"));
            spans.push(hint("H/L", "move card"));
            spans.push(hint("J/K", "reorder"));
            spans.push(hint("enter", "comments"));
            spans.push(hint("/", "filter"));
            spans.push(hint("p", "priority"));
            spans.push(hint("r", "refresh"));
            spans.push(hint("q", "quit"));
        }
        ViewMode::Comments => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("n", "new"));
            spans.push(hint("r", "reply"));
            spans.push(hint("e", "edit"));
            spans.push(hint("d", "delete"));
            spans.push(hint("esc", "board"));
            spans.push(hint("q", "quit"));
        }
    }

    if app.filter.is_active() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            " FILTERED ",
            Style::default()
                .fg(ratatui::style::Color::Black)
                .bg(ratatui::style::Color::Yellow),
        ));
    }

    if let Some((msg, _)) = &app.flash_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            msg.clone(),
            Style::default().fg(ratatui::style::Color::Yellow),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn hint(key: &str, desc: &str) -> Span<'static> {
    Span::styled(
        format!(" {key}:{desc} "),
        Style::default().fg(ratatui::style::Color::DarkGray),
    )
}
