//! Collection screen: a sortable, filterable table of one entity kind.

use biodesk_core::{Backend, Entity, ListPage, TableView as _};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, BorderType, Borders};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::dialog;
use crate::theme;
use crate::widgets::data_table::{TableEvent, TableWidget};
use crate::widgets::status::render_status;

pub struct ListScreen<E: Entity> {
    page: ListPage<E>,
    table: TableWidget,
    throbber: ThrobberState,
    action_tx: Option<UnboundedSender<Action>>,
}

impl<E: Entity> ListScreen<E> {
    pub fn new(backend: &Backend, changes: &UnboundedSender<()>) -> Self {
        let mut page = ListPage::new(backend);
        page.watch_changes(changes);
        page.sync();
        Self {
            page,
            table: TableWidget::new(),
            throbber: ThrobberState::default(),
            action_tx: None,
        }
    }

    /// Open the create form and submit it from a background task.
    fn start_create(&self) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let form = self.page.new_form();
        let writer = self.page.writer();
        tokio::spawn(async move {
            let Some(payload) = dialog::request_form(&tx, form).await else {
                return;
            };
            let note = match writer.create(&payload).await {
                Ok(record) => Notification::success(format!("Created {}", record.title())),
                Err(e) => {
                    warn!(kind = ?E::KIND, error = %e, "create failed");
                    Notification::error(e.to_string())
                }
            };
            let _ = tx.send(Action::Notify(note));
        });
    }

    fn activate(&mut self) -> Option<Action> {
        self.page.activate_selected().map(Action::Navigate)
    }
}

impl<E: Entity> Component for ListScreen<E> {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('n') => {
                self.start_create();
                return Ok(None);
            }
            KeyCode::Char('r') => {
                self.page.retry();
                return Ok(None);
            }
            _ => {}
        }
        if self.page.status().is_some() {
            return Ok(None);
        }
        let event = self.table.handle_key(key, self.page.table_mut());
        Ok(match event {
            TableEvent::Activate => self.activate(),
            TableEvent::Handled | TableEvent::Ignored => None,
        })
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.page.status().is_some() {
            return Ok(None);
        }
        let event = self.table.handle_mouse(mouse, self.page.table_mut());
        Ok(match event {
            TableEvent::Activate => self.activate(),
            TableEvent::Handled | TableEvent::Ignored => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DataChanged => {
                self.page.sync();
            }
            Action::FilterInput(text) => self.page.table_mut().set_filter(text),
            Action::Tick => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = E::KIND.label();
        match self.page.status() {
            Some(status) => {
                let block = Block::default()
                    .title(format!(" {title} "))
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default());
                let inner = block.inner(area);
                frame.render_widget(block, area);
                render_status(frame, inner, &status, &self.throbber);
            }
            None => self.table.render(frame, area, self.page.table(), title, true),
        }
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("Enter", "open"),
            ("n", "new"),
            ("s", "sort"),
            ("< >", "page"),
            ("r", "reload"),
        ]
    }

    fn accepts_filter(&self) -> bool {
        true
    }
}
