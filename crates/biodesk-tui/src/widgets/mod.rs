pub mod data_table;
pub mod form;
pub mod status;
pub mod sub_tabs;

/// Text width in terminal columns, saturating at `u16::MAX`.
pub(crate) fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

/// A `width` x `height` rectangle centred in `area`, shrunk to leave a
/// two-cell margin.
pub(crate) fn centered(area: ratatui::layout::Rect, width: u16, height: u16) -> ratatui::layout::Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    ratatui::layout::Rect::new(area.x + x, area.y + y, width, height)
}
