use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::model::comment::Comment;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(feed) = &app.feed else {
        return;
    };

    let rows: Vec<ListItem> = feed
        .flattened()
        .iter()
        .enumerate()
        .map(|(i, (comment, is_reply))| comment_line(comment, *is_reply, i == app.selected_comment))
        .collect();

    let rows = if rows.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No comments yet. Press n to add one.",
            Style::default().fg(ratatui::style::Color::DarkGray),
        )))]
    } else {
        rows
    };

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Cyan))
            .title(format!(" Comments — test case #{} ", feed.test_case_id())),
    );
    f.render_widget(list, area);
}

fn comment_line(comment: &Comment, is_reply: bool, selected: bool) -> ListItem<'static> {
    let indent = if is_reply { "    ↳ " } else { "" };
    let author = comment
        .author_name
        .clone()
        .unwrap_or_else(|| format!("user {}", comment.author_id));

    let mut header = format!(
        "{indent}{author} · {}",
        comment.created_at.format("%Y-%m-%d %H:%M")
    );
    if comment.was_edited() {
        header.push_str(" (edited)");
    }

    let header_span = Span::styled(
        header,
        Style::default().fg(ratatui::style::Color::DarkGray),
    );
    let body_style = if selected {
        Style::default()
            .fg(ratatui::style::Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let body = Span::styled(format!("{indent}{}", comment.content), body_style);

    ListItem::new(vec![Line::from(header_span), Line::from(body)])
}
