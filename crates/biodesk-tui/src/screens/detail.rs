//! Record screen: field list, optional trial sections, and a sub-tab per
//! related child collection.

use biodesk_core::{Backend, DetailPage, Entity, SectionState};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::dialog;
use crate::theme;
use crate::widgets::data_table::{TableEvent, TableWidget};
use crate::widgets::status::render_status;
use crate::widgets::sub_tabs::render_sub_tabs;
use crate::widgets::text_width;

pub struct DetailScreen<E: Entity> {
    page: DetailPage<E>,
    related_tab: usize,
    /// One widget per related panel so each keeps its own column cursor.
    tables: Vec<TableWidget>,
    throbber: ThrobberState,
    action_tx: Option<UnboundedSender<Action>>,
}

impl<E: Entity> DetailScreen<E> {
    pub fn new(backend: &Backend, key: &str, changes: &UnboundedSender<()>) -> Self {
        let mut page = DetailPage::<E>::new(backend, key);
        page.watch_changes(changes);
        page.sync();
        let tables = page.related().iter().map(|_| TableWidget::new()).collect();
        Self {
            page,
            related_tab: 0,
            tables,
            throbber: ThrobberState::default(),
            action_tx: None,
        }
    }

    fn cycle_related(&mut self, forward: bool) {
        let len = self.page.related().len();
        if len == 0 {
            return;
        }
        self.related_tab = if forward {
            (self.related_tab + 1) % len
        } else {
            (self.related_tab + len - 1) % len
        };
    }

    fn start_edit(&self) -> Option<Action> {
        let tx = self.action_tx.clone()?;
        let Some(form) = self.page.edit_form() else {
            return Some(Action::Notify(Notification::info("Record is still loading")));
        };
        let writer = self.page.writer();
        tokio::spawn(async move {
            let Some(payload) = dialog::request_form(&tx, form).await else {
                return;
            };
            let note = match writer.update(&payload).await {
                Ok(record) => Notification::success(format!("Saved {}", record.title())),
                Err(e) => {
                    warn!(kind = ?E::KIND, error = %e, "update failed");
                    Notification::error(e.to_string())
                }
            };
            let _ = tx.send(Action::Notify(note));
        });
        None
    }

    fn start_delete(&self) -> Option<Action> {
        let tx = self.action_tx.clone()?;
        if self.page.record().is_none() {
            return Some(Action::Notify(Notification::info("Record is still loading")));
        }
        let title = self.page.title();
        let writer = self.page.writer();
        tokio::spawn(async move {
            let question = format!("Delete {title}? This cannot be undone.");
            if !dialog::confirm(&tx, question).await {
                return;
            }
            match writer.delete().await {
                Ok(route) => {
                    let _ = tx.send(Action::Notify(Notification::success(format!(
                        "Deleted {title}"
                    ))));
                    let _ = tx.send(Action::Navigate(route));
                }
                Err(e) => {
                    warn!(kind = ?E::KIND, error = %e, "delete failed");
                    let _ = tx.send(Action::Notify(Notification::error(e.to_string())));
                }
            }
        });
        None
    }

    fn open_parent(&self) -> Action {
        self.page.parent_route().map_or_else(
            || Action::Notify(Notification::info("No parent record")),
            Action::Navigate,
        )
    }

    fn activate_related(&mut self) -> Option<Action> {
        self.page
            .related_mut()
            .get_mut(self.related_tab)
            .and_then(|panel| panel.activate())
            .map(Action::Navigate)
    }

    fn render_fields(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.page.title()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(field_lines(&self.page.fields())), inner);
    }

    fn render_sections(&self, frame: &mut Frame, area: Rect) {
        let sections = self.page.sections();
        let areas = Layout::vertical(vec![Constraint::Fill(1); sections.len()]).split(area);
        for (section, area) in sections.iter().zip(areas.iter()) {
            let block = Block::default()
                .title(format!(" {} ", section.kind().label()))
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default());
            let inner = block.inner(*area);
            frame.render_widget(block, *area);

            let lines = match section.state() {
                SectionState::Loading => vec![Line::styled("Loading...", theme::label())],
                SectionState::Absent => vec![Line::styled(
                    format!("No {} data", section.kind().singular()),
                    theme::label(),
                )],
                SectionState::Failed(message) => vec![
                    Line::styled(format!("✗ {message}"), theme::error()),
                    Line::from(vec![
                        Span::styled("r", theme::key_hint_key()),
                        Span::styled(" retry", theme::key_hint()),
                    ]),
                ],
                SectionState::Present(fields) => field_lines(&fields),
            };
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        }
    }

    fn render_related(&self, frame: &mut Frame, area: Rect) {
        let related = self.page.related();
        let Some(panel) = related.get(self.related_tab) else {
            return;
        };

        let [tabs_area, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);
        let labels: Vec<String> = related
            .iter()
            .map(|p| match p.status() {
                None => format!("{} ({})", p.label(), p.table().total_len()),
                Some(_) => p.label().to_owned(),
            })
            .collect();
        frame.render_widget(
            Paragraph::new(render_sub_tabs(&labels, self.related_tab)),
            tabs_area,
        );

        match panel.status() {
            Some(status) => {
                let block = Block::default()
                    .title(format!(" {} ", panel.label()))
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default());
                let inner = block.inner(body);
                frame.render_widget(block, body);
                render_status(frame, inner, &status, &self.throbber);
            }
            None => {
                if let Some(widget) = self.tables.get(self.related_tab) {
                    widget.render(frame, body, panel.table(), panel.label(), true);
                }
            }
        }
    }
}

fn field_lines(fields: &[(String, String)]) -> Vec<Line<'static>> {
    let width = fields
        .iter()
        .map(|(label, _)| usize::from(text_width(label)))
        .max()
        .unwrap_or(0);
    fields
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!(" {label:<width$}  "), theme::label()),
                Span::styled(value.clone(), theme::value()),
            ])
        })
        .collect()
}

impl<E: Entity> Component for DetailScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('e') => return Ok(self.start_edit()),
            KeyCode::Char('d') if !ctrl => return Ok(self.start_delete()),
            KeyCode::Char('u') if !ctrl => return Ok(Some(self.open_parent())),
            KeyCode::Char('r') => {
                self.page.retry();
                return Ok(None);
            }
            KeyCode::Char(']') => {
                self.cycle_related(true);
                return Ok(None);
            }
            KeyCode::Char('[') => {
                self.cycle_related(false);
                return Ok(None);
            }
            _ => {}
        }

        let tab = self.related_tab;
        let (Some(panel), Some(widget)) =
            (self.page.related_mut().get_mut(tab), self.tables.get_mut(tab))
        else {
            return Ok(None);
        };
        if panel.status().is_some() {
            return Ok(None);
        }
        let event = widget.handle_key(key, panel.table_mut());
        Ok(match event {
            TableEvent::Activate => self.activate_related(),
            TableEvent::Handled | TableEvent::Ignored => None,
        })
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let tab = self.related_tab;
        let (Some(panel), Some(widget)) =
            (self.page.related_mut().get_mut(tab), self.tables.get_mut(tab))
        else {
            return Ok(None);
        };
        if panel.status().is_some() {
            return Ok(None);
        }
        let event = widget.handle_mouse(mouse, panel.table_mut());
        Ok(match event {
            TableEvent::Activate => self.activate_related(),
            TableEvent::Handled | TableEvent::Ignored => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DataChanged => {
                self.page.sync();
            }
            Action::FilterInput(text) => {
                if let Some(panel) = self.page.related_mut().get_mut(self.related_tab) {
                    panel.table_mut().set_filter(text);
                }
            }
            Action::Tick => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if let Some(status) = self.page.status() {
            let block = Block::default()
                .title(format!(" {} ", self.page.title()))
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default());
            let inner = block.inner(area);
            frame.render_widget(block, area);
            render_status(frame, inner, &status, &self.throbber);
            return;
        }

        let has_related = !self.page.related().is_empty();
        let field_rows = u16::try_from(self.page.fields().len()).unwrap_or(u16::MAX);
        let top_height = if has_related {
            Constraint::Length(field_rows.saturating_add(2).min(area.height / 2))
        } else {
            Constraint::Fill(1)
        };
        let [top, bottom] = Layout::vertical([top_height, Constraint::Fill(1)]).areas(area);

        if self.page.sections().is_empty() {
            self.render_fields(frame, top);
        } else {
            let [fields_area, sections_area] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(top);
            self.render_fields(frame, fields_area);
            self.render_sections(frame, sections_area);
        }

        if has_related {
            self.render_related(frame, bottom);
        }
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("e", "edit"),
            ("d", "delete"),
            ("u", "parent"),
            ("[ ]", "related"),
            ("r", "reload"),
        ]
    }

    fn accepts_filter(&self) -> bool {
        !self.page.related().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biodesk_core::model::{Patient, Tumor};
    use tokio::sync::mpsc;

    use super::*;
    use crate::action::NotificationLevel;
    use crate::screens::tests::offline_backend;

    fn press<E: Entity>(screen: &mut DetailScreen<E>, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[tokio::test]
    async fn brackets_cycle_related_tabs() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut screen = DetailScreen::<Tumor>::new(&offline_backend(), "BB-01", &tx);
        assert_eq!(screen.tables.len(), 2);

        press(&mut screen, KeyCode::Char(']'));
        assert_eq!(screen.related_tab, 1);
        press(&mut screen, KeyCode::Char(']'));
        assert_eq!(screen.related_tab, 0);
        press(&mut screen, KeyCode::Char('['));
        assert_eq!(screen.related_tab, 1);
    }

    #[tokio::test]
    async fn record_actions_wait_for_the_record() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let mut screen = DetailScreen::<Patient>::new(&offline_backend(), "N1", &tx);
        screen.init(action_tx).unwrap();

        for code in [KeyCode::Char('e'), KeyCode::Char('d'), KeyCode::Char('u')] {
            let Some(Action::Notify(note)) = press(&mut screen, code) else {
                panic!("expected a notification for {code:?}");
            };
            assert_eq!(note.level, NotificationLevel::Info);
        }
    }

    #[test]
    fn field_lines_align_labels() {
        let lines = field_lines(&[
            ("NHC".into(), "N1".into()),
            ("Birth Date".into(), "1970-01-01".into()),
        ]);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, " NHC         N1");
    }
}
