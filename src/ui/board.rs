use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::model::item::BoardItem;
use crate::ui::theme::{column_accent, kind_color, priority_color};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let view = app.board.filtered(&app.filter);
    if view.is_empty() {
        return;
    }

    let percent = (100 / view.len()) as u16;
    let constraints: Vec<Constraint> = view.iter().map(|_| Constraint::Percentage(percent)).collect();
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (col_idx, ((column, items), slot)) in view.iter().zip(slots.iter()).enumerate() {
        let rows: Vec<ListItem> = items
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let selected = col_idx == app.selected_column && row == app.selected_row;
                card_line(item, selected, slot.width)
            })
            .collect();

        let mut title = format!(" {} ({}) ", column.title, items.len());
        if app.loading && col_idx == 0 {
            title = format!(" {} (loading...) ", column.title);
        }

        let list = List::new(rows).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(column_accent(&column.id)))
                .title(title),
        );
        f.render_widget(list, *slot);
    }
}

fn card_line(item: &BoardItem, selected: bool, width: u16) -> ListItem<'static> {
    let badge = Span::styled(
        format!("{} ", item.kind.badge()),
        Style::default().fg(kind_color(item.kind)),
    );
    let priority = Span::styled(
        format!("[{}] ", item.priority),
        Style::default().fg(priority_color(item.priority)),
    );

    let max_title = width.saturating_sub(18) as usize;
    let title: String = item.title.chars().take(max_title).collect();
    let title_style = if selected {
        Style::default()
            .fg(ratatui::style::Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(vec![
        badge,
        priority,
        Span::styled(title, title_style),
    ]))
}
