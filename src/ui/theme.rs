use ratatui::style::Color;

use crate::model::item::{ItemKind, Priority};

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => Color::Red,
        Priority::High => Color::Yellow,
        Priority::Medium => Color::Blue,
        Priority::Low => Color::Gray,
    }
}

pub fn kind_color(kind: ItemKind) -> Color {
    match kind {
        ItemKind::Failure => Color::Rgb(0xE5, 0x73, 0x73),
        ItemKind::ManualCase => Color::Rgb(0x4F, 0xC3, 0xF7),
        ItemKind::AutomatedCase => Color::Rgb(0x81, 0xC7, 0x84),
    }
}

pub fn column_accent(column_id: &str) -> Color {
    match column_id {
        "new" => Color::Cyan,
        "in-progress" => Color::Yellow,
        "blocked" => Color::Red,
        "resolved" => Color::Green,
        _ => Color::Gray,
    }
}
