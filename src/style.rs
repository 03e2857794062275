use ratatui::style::{Color, Modifier, Style};

// --- Sizing ---
pub const HEADER_HEIGHT: u16 = 2;
pub const FOOTER_HEIGHT: u16 = 1;
pub const NAME_COL_WIDTH: usize = 40;
pub const SIZE_COL_WIDTH: usize = 10;

// --- Timing ---
pub const POLL_INTERVAL_MS: u64 = 100;

// --- Glyphs ---
pub const HIGHLIGHT_SYMBOL: &str = "> ";
pub const BREADCRUMB_SEPARATOR: &str = " / ";

pub fn title() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub fn dimmed() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn folder() -> Style {
    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
}

pub fn selected() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red)
}

pub fn info() -> Style {
    Style::default().fg(Color::Green)
}

pub fn loading() -> Style {
    Style::default().fg(Color::Yellow)
}
