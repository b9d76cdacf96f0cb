//! Palette and semantic styles for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const TEAL: Color = Color::Rgb(94, 234, 212); // #5eead4
pub const VIOLET: Color = Color::Rgb(167, 139, 250); // #a78bfa
pub const AMBER: Color = Color::Rgb(251, 191, 36); // #fbbf24
pub const GREEN: Color = Color::Rgb(74, 222, 128); // #4ade80
pub const RED: Color = Color::Rgb(248, 113, 113); // #f87171
pub const SKY: Color = Color::Rgb(125, 211, 252); // #7dd3fc

pub const TEXT: Color = Color::Rgb(203, 213, 225); // #cbd5e1
pub const MUTED: Color = Color::Rgb(100, 116, 139); // #64748b
pub const BG_HIGHLIGHT: Color = Color::Rgb(30, 41, 59); // #1e293b
pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0f172a

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(VIOLET)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(TEAL)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Header cell of the column `s` would sort.
pub fn table_header_cursor() -> Style {
    table_header().fg(VIOLET)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(VIOLET)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(VIOLET).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

/// Field labels on detail pages and forms.
pub fn label() -> Style {
    Style::default().fg(MUTED)
}

pub fn value() -> Style {
    Style::default().fg(TEXT)
}

pub fn error() -> Style {
    Style::default().fg(RED)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}
