//! Placeholder shown instead of content: spinner, error with retry, or an
//! empty-state message.

use biodesk_core::StatusView;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::theme;

/// Glyph for an icon name used by entity kinds and empty states.
pub fn icon_glyph(name: &str) -> &'static str {
    match name {
        "person" => "◉",
        "coronavirus" => "✺",
        "water_drop" => "◍",
        "science" => "⚗",
        "swap_horiz" => "⇄",
        "assignment" => "▤",
        "inbox" => "∅",
        _ => "≡",
    }
}

/// Render `status` centred in `area`.
pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusView, throbber: &ThrobberState) {
    if let StatusView::Loading = status {
        let [_, row, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        let width = super::text_width(status.title()).saturating_add(2);
        let [_, cell, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .areas(row);
        let spinner = Throbber::default()
            .label(status.title())
            .style(Style::default().fg(theme::MUTED))
            .throbber_style(Style::default().fg(theme::VIOLET));
        frame.render_stateful_widget(spinner, cell, &mut throbber.clone());
        return;
    }

    let lines = status_lines(status);
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let [_, body, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        body,
    );
}

fn status_lines(status: &StatusView) -> Vec<Line<'static>> {
    match status {
        StatusView::Loading => vec![Line::from(status.title().to_owned())],
        StatusView::Error { message } => vec![
            Line::styled(
                format!("✗ {}", status.title()),
                theme::error().add_modifier(Modifier::BOLD),
            ),
            Line::styled(message.clone(), theme::value()),
            Line::default(),
            Line::from(vec![
                Span::styled("r", theme::key_hint_key()),
                Span::styled(" retry", theme::key_hint()),
            ]),
        ],
        StatusView::Empty {
            icon,
            title,
            message,
        } => vec![
            Line::styled(icon_glyph(icon), theme::label()),
            Line::styled(title.clone(), theme::title_style()),
            Line::styled(message.clone(), theme::label()),
        ],
    }
}
