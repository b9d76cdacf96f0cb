//! Horizontal sub-tab bar for the related collections on a detail page.

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::theme;

/// Renders a horizontal tab bar line with the active tab highlighted.
///
/// The active tab is bracketed in violet; inactive tabs use the plain text
/// colour. Labels are owned since they usually carry a row count.
pub fn render_sub_tabs(labels: &[String], active_index: usize) -> Line<'static> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }

        if i == active_index {
            spans.push(Span::styled(
                format!("[{label}]"),
                theme::tab_active().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label.clone(), theme::tab_inactive()));
        }
    }

    Line::from(spans)
}
