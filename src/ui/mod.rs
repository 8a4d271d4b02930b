pub mod board;
pub mod command_bar;
pub mod comments;
pub mod footer;
pub mod theme;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::{App, ViewMode};

pub fn render(f: &mut Frame, app: &App) {
    let size = f.area();

    // Bottom bar: command bar (3) when input active, else footer (1)
    let bottom_height = if app.input_active { 3 } else { 1 };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(bottom_height)])
        .split(size);

    let main_area = vertical[0];
    let bottom_area = vertical[1];

    match app.view_mode {
        ViewMode::Board => board::render(f, main_area, app),
        ViewMode::Comments => comments::render(f, main_area, app),
    }

    if app.input_active {
        command_bar::render(f, bottom_area, app);
    } else {
        footer::render(f, bottom_area, app);
    }
}
