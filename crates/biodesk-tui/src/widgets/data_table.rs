//! One table widget for every entity kind, driven through [`TableView`].
//!
//! Keys: `j`/`k` move, `h`/`l` pick the sort column, `s` cycles its sort,
//! `<`/`>` page, `+` cycles the page size, `Enter`/`Space` activate.
//! Clicking a row activates it; the wheel moves the cursor.

use std::cell::Cell;

use biodesk_core::{SortDirection, TableView};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Row, Table, TableState};

use super::text_width;
use crate::theme;

const MAX_COLUMN_WIDTH: u16 = 32;

/// What a key or mouse event did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// Not a table key; the screen may handle it.
    Ignored,
    Handled,
    /// The cursor row was activated.
    Activate,
}

/// Per-screen widget state: the sort-column cursor and the geometry of the
/// last render for mouse hit-testing.
#[derive(Debug, Default)]
pub struct TableWidget {
    column: usize,
    rows_area: Cell<Rect>,
    offset: Cell<usize>,
}

impl TableWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: KeyEvent, table: &mut dyn TableView) -> TableEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('d') if ctrl => table.next_page(),
            KeyCode::Char('u') if ctrl => table.prev_page(),
            _ if ctrl => return TableEvent::Ignored,
            KeyCode::Char('j') | KeyCode::Down => table.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => table.move_cursor(-1),
            KeyCode::Char('>') | KeyCode::PageDown => table.next_page(),
            KeyCode::Char('<') | KeyCode::PageUp => table.prev_page(),
            KeyCode::Char('g') | KeyCode::Home => table.set_page(0),
            KeyCode::Char('G') | KeyCode::End => table.set_page(table.page_count() - 1),
            KeyCode::Char('h') | KeyCode::Left => self.column = self.column.saturating_sub(1),
            KeyCode::Char('l') | KeyCode::Right => {
                let last = table.columns().len().saturating_sub(1);
                self.column = (self.column + 1).min(last);
            }
            KeyCode::Char('s') => {
                if let Some(col) = table.columns().get(self.column) {
                    table.toggle_sort(col.key);
                }
            }
            KeyCode::Char('+') => table.cycle_page_size(),
            KeyCode::Enter | KeyCode::Char(' ') => return TableEvent::Activate,
            _ => return TableEvent::Ignored,
        }
        TableEvent::Handled
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, table: &mut dyn TableView) -> TableEvent {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                table.move_cursor(1);
                TableEvent::Handled
            }
            MouseEventKind::ScrollUp => {
                table.move_cursor(-1);
                TableEvent::Handled
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(row) = self.row_at(mouse.column, mouse.row) else {
                    return TableEvent::Ignored;
                };
                if row >= table.page_keys().len() {
                    return TableEvent::Ignored;
                }
                let delta = isize::try_from(row).unwrap_or(isize::MAX)
                    - isize::try_from(table.cursor()).unwrap_or(isize::MAX);
                table.move_cursor(delta);
                TableEvent::Activate
            }
            _ => TableEvent::Ignored,
        }
    }

    /// Page row under a screen position, from the last render.
    fn row_at(&self, x: u16, y: u16) -> Option<usize> {
        let area = self.rows_area.get();
        // The first line of the area is the header.
        let first = area.y.saturating_add(1);
        let inside = x >= area.x && x < area.right() && y >= first && y < area.bottom();
        inside.then(|| usize::from(y - first) + self.offset.get())
    }

    /// Render the table in a bordered block titled `title`.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        table: &dyn TableView,
        title: &str,
        focused: bool,
    ) {
        let mut heading = vec![Span::styled(
            format!(" {title} ({}/{}) ", table.filtered_len(), table.total_len()),
            theme::title_style(),
        )];
        if !table.filter().is_empty() {
            heading.push(Span::styled(format!("/{} ", table.filter()), theme::key_hint()));
        }
        let block = Block::default()
            .title(Line::from(heading))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [rows_area, footer_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        self.rows_area.set(rows_area);

        if table.filtered_len() == 0 {
            self.offset.set(0);
            let message = format!("No rows match \"{}\"", table.filter());
            frame.render_widget(
                Paragraph::new(Line::styled(message, theme::label())),
                rows_area,
            );
        } else {
            self.render_rows(frame, rows_area, table);
        }

        frame.render_widget(Paragraph::new(footer(table)), footer_area);
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect, table: &dyn TableView) {
        let cells = table.page_cells();
        let sort = table.sort();

        let header_cells: Vec<Span> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let arrow = match sort {
                    Some(s) if s.column == col.key => match s.direction {
                        SortDirection::Ascending => " ▲",
                        SortDirection::Descending => " ▼",
                    },
                    _ => "",
                };
                let style = if i == self.column {
                    theme::table_header_cursor()
                } else {
                    theme::table_header()
                };
                Span::styled(format!("{}{arrow}", col.label), style)
            })
            .collect();

        let widths: Vec<Constraint> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let widest = cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| text_width(cell))
                    .fold(text_width(col.label).saturating_add(2), u16::max);
                Constraint::Length(widest.min(MAX_COLUMN_WIDTH))
            })
            .collect();

        let rows: Vec<Row> = cells
            .into_iter()
            .map(|row| Row::new(row).style(theme::table_row()))
            .collect();

        let widget = Table::new(rows, widths)
            .header(Row::new(header_cells))
            .column_spacing(2)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");

        let mut state = TableState::default().with_selected(Some(table.cursor()));
        frame.render_stateful_widget(widget, area, &mut state);
        self.offset.set(state.offset());
    }
}

fn footer(table: &dyn TableView) -> Line<'static> {
    let first = table.page_index() * table.page_size();
    let shown = table.page_keys().len();
    let range = if shown == 0 {
        "0".to_owned()
    } else {
        format!("{}-{}", first + 1, first + shown)
    };
    Line::from(vec![
        Span::styled(
            format!(
                " Page {}/{}",
                table.page_index() + 1,
                table.page_count()
            ),
            theme::value(),
        ),
        Span::styled(
            format!(
                " · rows {range} of {} · {} per page",
                table.filtered_len(),
                table.page_size()
            ),
            theme::label(),
        ),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biodesk_core::DataTable;
    use biodesk_core::model::Patient;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn patients() -> DataTable<Patient> {
        let mut table = DataTable::<Patient>::new().with_page_size(2);
        table.set_data(["N2", "N1", "N3"].map(|nhc| Patient {
            nhc: nhc.into(),
            sex: Some(if nhc == "N2" { "M" } else { "F" }.into()),
            birth_date: None,
        }));
        table
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn draw(widget: &TableWidget, table: &DataTable<Patient>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                widget.render(frame, area, table, "Patients", true);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn sort_follows_the_column_cursor() {
        let mut widget = TableWidget::new();
        let mut table = patients();

        assert_eq!(widget.handle_key(key(KeyCode::Char('s')), &mut table), TableEvent::Handled);
        assert_eq!(table.page_keys(), vec!["N1", "N2"]);

        widget.handle_key(key(KeyCode::Char('l')), &mut table);
        assert_eq!(widget.column, 1);
        widget.handle_key(key(KeyCode::Char('s')), &mut table);
        assert_eq!(table.sort().unwrap().column, "sex");

        for _ in 0..5 {
            widget.handle_key(key(KeyCode::Char('l')), &mut table);
        }
        assert_eq!(widget.column, 2, "column cursor stops at the last column");
    }

    #[test]
    fn paging_keys() {
        let mut widget = TableWidget::new();
        let mut table = patients();

        widget.handle_key(key(KeyCode::Char('>')), &mut table);
        assert_eq!(table.page_index(), 1);
        widget.handle_key(key(KeyCode::Char('<')), &mut table);
        assert_eq!(table.page_index(), 0);
        widget.handle_key(key(KeyCode::Char('G')), &mut table);
        assert_eq!(table.page_index(), 1);

        widget.handle_key(key(KeyCode::Char('+')), &mut table);
        assert_eq!(table.page_size(), 10);
        assert_eq!(table.page_index(), 0);

        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(widget.handle_key(ctrl_d, &mut table), TableEvent::Handled);
    }

    #[test]
    fn screen_keys_pass_through() {
        let mut widget = TableWidget::new();
        let mut table = patients();
        assert_eq!(widget.handle_key(key(KeyCode::Char('e')), &mut table), TableEvent::Ignored);
        assert_eq!(widget.handle_key(key(KeyCode::Enter), &mut table), TableEvent::Activate);
    }

    #[test]
    fn render_shows_sort_arrow_and_footer() {
        let mut widget = TableWidget::new();
        let mut table = patients();
        widget.handle_key(key(KeyCode::Char('s')), &mut table);

        let screen = draw(&widget, &table);
        assert!(screen.contains("Patients (3/3)"));
        assert!(screen.contains("NHC ▲"));
        assert!(screen.contains("Page 1/2"));
        assert!(screen.contains("rows 1-2 of 3"));
    }

    #[test]
    fn filter_without_matches_says_so() {
        let widget = TableWidget::new();
        let mut table = patients();
        table.set_filter("zzz");
        let screen = draw(&widget, &table);
        assert!(screen.contains("No rows match \"zzz\""));
        assert!(screen.contains("(0/3)"));
    }

    #[test]
    fn clicking_a_row_activates_it() {
        let mut widget = TableWidget::new();
        let mut table = patients();
        draw(&widget, &table);

        // Border at y=0, header at y=1, first data row at y=2.
        let click = |row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(widget.handle_mouse(click(3), &mut table), TableEvent::Activate);
        assert_eq!(table.cursor(), 1);
        assert_eq!(widget.handle_mouse(click(1), &mut table), TableEvent::Ignored);
        assert_eq!(widget.handle_mouse(click(7), &mut table), TableEvent::Ignored);
    }
}
