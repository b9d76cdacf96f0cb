//! Dashboard screen: a card per top-level collection with its live count.

use std::cell::RefCell;

use biodesk_core::{Backend, Dashboard, Remote};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::status::icon_glyph;

const COLUMNS: usize = 3;

pub struct DashboardScreen {
    dashboard: Dashboard,
    selected: usize,
    throbber: ThrobberState,
    card_areas: RefCell<Vec<Rect>>,
}

impl DashboardScreen {
    pub fn new(backend: &Backend, changes: &UnboundedSender<()>) -> Self {
        let dashboard = Dashboard::new(backend);
        dashboard.watch_changes(changes);
        Self {
            dashboard,
            selected: 0,
            throbber: ThrobberState::default(),
            card_areas: RefCell::new(Vec::new()),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.dashboard.cards().len();
        if len == 0 {
            return;
        }
        let target = isize::try_from(self.selected).unwrap_or(0) + delta;
        let last = isize::try_from(len - 1).unwrap_or(0);
        self.selected = usize::try_from(target.clamp(0, last)).unwrap_or(0);
    }

    fn open(&self, index: usize) -> Option<Action> {
        self.dashboard
            .cards()
            .get(index)
            .map(|card| Action::Navigate(card.route()))
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, index: usize) {
        let card = &self.dashboard.cards()[index];
        let block = Block::default()
            .title(format!(" {} {} ", icon_glyph(card.icon()), card.title()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if index == self.selected {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [count_area, _, description_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        match card.count() {
            Remote::Loading | Remote::Idle => {
                let spinner = Throbber::default()
                    .label("counting")
                    .style(Style::default().fg(theme::MUTED))
                    .throbber_style(Style::default().fg(theme::VIOLET));
                frame.render_stateful_widget(spinner, count_area, &mut self.throbber.clone());
            }
            Remote::Ready(count) => {
                let noun = if *count == 1 { "record" } else { "records" };
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled(
                            count.to_string(),
                            Style::default().fg(theme::TEAL).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!(" {noun}"), theme::label()),
                    ])),
                    count_area,
                );
            }
            Remote::Failed(err) => {
                frame.render_widget(
                    Paragraph::new(Span::styled(format!("✗ {err}"), theme::error())),
                    count_area,
                );
            }
        }

        frame.render_widget(
            Paragraph::new(Span::styled(card.description(), theme::label()))
                .wrap(Wrap { trim: true }),
            description_area,
        );
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let step = isize::try_from(COLUMNS).unwrap_or(1);
        match key.code {
            KeyCode::Char('l') | KeyCode::Right => self.move_selection(1),
            KeyCode::Char('h') | KeyCode::Left => self.move_selection(-1),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(step),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-step),
            KeyCode::Enter | KeyCode::Char(' ') => return Ok(self.open(self.selected)),
            KeyCode::Char('r') => self.dashboard.retry(),
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let hit = self
            .card_areas
            .borrow()
            .iter()
            .position(|area| area.contains(Position::new(mouse.column, mouse.row)));
        let Some(index) = hit else {
            return Ok(None);
        };
        self.selected = index;
        Ok(self.open(index))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::Tick = action {
            self.throbber.calc_next();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Biobank ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let count = self.dashboard.cards().len();
        let rows = count.div_ceil(COLUMNS).max(1);
        let row_areas = Layout::vertical(vec![Constraint::Max(7); rows]).split(inner);

        let mut areas = Vec::with_capacity(count);
        for (r, row_area) in row_areas.iter().enumerate() {
            let cells = Layout::horizontal(vec![Constraint::Fill(1); COLUMNS]).split(*row_area);
            for (c, cell) in cells.iter().enumerate() {
                let index = r * COLUMNS + c;
                if index < count {
                    self.render_card(frame, *cell, index);
                    areas.push(*cell);
                }
            }
        }
        *self.card_areas.borrow_mut() = areas;
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("←→↑↓", "select"), ("Enter", "open"), ("r", "retry")]
    }
}
