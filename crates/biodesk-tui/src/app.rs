//! Application core: event loop, navigation history, modals, and overlays.

use std::time::{Duration, Instant};

use biodesk_core::{Backend, Route};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tui_input::{Input, InputRequest};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::dialog::ConfirmRequest;
use crate::event::{Event, EventReader};
use crate::screen::Tab;
use crate::screens::create_screen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::centered;
use crate::widgets::form::{FormModal, FormOutcome};

const MAX_HISTORY: usize = 50;
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Backend reachability as last reported by the health probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected(String),
}

/// Top-level application state and event loop.
pub struct App {
    backend: Backend,
    /// Route of the mounted screen.
    route: Route,
    /// Routes to return to with Esc, oldest first.
    history: Vec<Route>,
    screen: Box<dyn Component>,
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    /// Filter prompt, while open.
    filter: Option<Input>,
    /// Filter applied to the mounted screen.
    filter_text: String,
    /// Open create / edit form (captures all input).
    form: Option<FormModal>,
    /// Open yes/no dialog (captures all input).
    pending_confirm: Option<ConfirmRequest>,
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Every screen binding signals here; the data bridge drains it.
    changes_tx: mpsc::UnboundedSender<()>,
    changes_rx: Option<mpsc::UnboundedReceiver<()>>,
    data_cancel: CancellationToken,
}

impl App {
    /// Create the app with `route` mounted. Must be called inside a tokio
    /// runtime since screens start fetching right away.
    pub fn new(backend: Backend, route: Route) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let mut screen = create_screen(&route, &backend, &changes_tx);
        screen.init(action_tx.clone())?;

        Ok(Self {
            backend,
            route,
            history: Vec::new(),
            screen,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            filter: None,
            filter_text: String::new(),
            form: None,
            pending_confirm: None,
            notification: None,
            action_tx,
            action_rx,
            changes_tx,
            changes_rx: Some(changes_rx),
            data_cancel: CancellationToken::new(),
        })
    }

    /// Run the main event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;

        if let Some(changes) = self.changes_rx.take() {
            tokio::spawn(crate::data_bridge::spawn_data_bridge(
                self.backend.clone(),
                changes,
                self.action_tx.clone(),
                self.data_cancel.clone(),
            ));
        }

        let mut events = EventReader::new(Duration::from_millis(250));
        let (width, height) = tui.size()?;
        info!(route = %self.route, width, height, "TUI event loop started");
        tui.draw(|frame| self.render(frame))?;

        while self.running {
            // 1. Wait for input or for an action from a background task
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    if let Some(action) = self.handle_event(event)? {
                        self.action_tx.send(action)?;
                    }
                }
                Some(action) = self.action_rx.recv() => self.process_action(action)?,
            }

            // 2. Drain everything queued, then redraw once
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(action)?;
            }
            tui.draw(|frame| self.render(frame))?;
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<Option<Action>> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Paste(text) => Ok(self.handle_paste(&text)),
            Event::Resize(w, h) => Ok(Some(Action::Resize(w, h))),
            Event::Tick => Ok(Some(Action::Tick)),
        }
    }

    /// Map a key event to an action. Modals capture everything; global
    /// keys come next; the rest goes to the mounted screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if let Some(confirm) = self.pending_confirm.take() {
            match key.code {
                KeyCode::Char('y' | 'Y') => confirm.answer(true),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => confirm.answer(false),
                _ => self.pending_confirm = Some(confirm),
            }
            return Ok(None);
        }

        if let Some(form) = &mut self.form {
            if form.handle_key(key) == FormOutcome::Closed {
                self.form = None;
            }
            return Ok(None);
        }

        if self.filter.is_some() {
            return Ok(self.handle_filter_key(key));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Some(Action::Quit)),
            KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
            KeyCode::Char('/') if self.screen.accepts_filter() => {
                return Ok(Some(Action::OpenFilter));
            }
            KeyCode::Char(c @ '1'..='7') => {
                let tab = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(Tab::from_number);
                if let Some(tab) = tab {
                    return Ok(Some(Action::Navigate(tab.route())));
                }
            }
            KeyCode::Tab => return Ok(Some(Action::Navigate(self.tab().next().route()))),
            KeyCode::BackTab => return Ok(Some(Action::Navigate(self.tab().prev().route()))),
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    /// Keys while the filter prompt is open. Every edit re-filters live.
    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<Action> {
        let input = self.filter.as_mut()?;
        let request = match key.code {
            KeyCode::Esc => {
                self.filter = None;
                return Some(Action::FilterInput(String::new()));
            }
            KeyCode::Enter => return Some(Action::CloseFilter),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputRequest::DeleteLine
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            _ => return None,
        };
        input.handle(request)?;
        Some(Action::FilterInput(input.value().to_owned()))
    }

    fn handle_paste(&mut self, text: &str) -> Option<Action> {
        if let Some(form) = &mut self.form {
            form.paste(text);
            return None;
        }
        let input = self.filter.as_mut()?;
        for c in text.chars().filter(|c| !c.is_control()) {
            let _ = input.handle(InputRequest::InsertChar(c));
        }
        Some(Action::FilterInput(input.value().to_owned()))
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.form.is_some() || self.pending_confirm.is_some() || self.help_visible {
            return Ok(None);
        }
        self.screen.handle_mouse_event(mouse)
    }

    fn tab(&self) -> Tab {
        Tab::for_route(&self.route)
    }

    /// Replace the mounted screen with a fresh one for `route`.
    fn mount(&mut self, route: Route) -> Result<()> {
        debug!(from = %self.route, to = %route, "navigating");
        self.screen = create_screen(&route, &self.backend, &self.changes_tx);
        self.screen.init(self.action_tx.clone())?;
        self.route = route;
        self.filter = None;
        self.filter_text.clear();
        Ok(())
    }

    /// Apply one action to app state and the mounted screen.
    fn process_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            // The next draw picks up the new size.
            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::Navigate(route) => {
                if route != self.route {
                    let previous = self.route.clone();
                    self.mount(route)?;
                    self.history.push(previous);
                    if self.history.len() > MAX_HISTORY {
                        self.history.remove(0);
                    }
                }
            }

            Action::GoBack => {
                if let Some(previous) = self.history.pop() {
                    self.mount(previous)?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::OpenFilter => self.filter = Some(Input::new(self.filter_text.clone())),
            Action::CloseFilter => self.filter = None,
            Action::FilterInput(ref text) => {
                self.filter_text.clone_from(text);
                self.forward(&action)?;
            }

            Action::Connected => self.connection_status = ConnectionStatus::Connected,
            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Disconnected(reason);
            }

            // A second modal while one is open is answered as cancelled.
            Action::OpenForm(request) => {
                if self.form.is_none() && self.pending_confirm.is_none() {
                    self.form = Some(FormModal::new(request));
                }
            }
            Action::OpenConfirm(request) => {
                if self.form.is_none() && self.pending_confirm.is_none() {
                    self.pending_confirm = Some(request);
                } else {
                    request.answer(false);
                }
            }

            Action::Notify(notification) => {
                self.notification = Some((notification, Instant::now()));
            }

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.forward(&action)?;
            }

            Action::DataChanged => self.forward(&action)?,
        }
        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let [content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.screen.render(frame, content_area);
        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        // Overlays, last = topmost
        if let Some((notification, _)) = &self.notification {
            render_notification(frame, area, notification);
        }
        if let Some(form) = &self.form {
            form.render(frame, area);
        }
        if let Some(confirm) = &self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let narrow = area.width < 100;
        let active = self.tab();
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .map(|&tab| {
                let style = if tab == active {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                let label = if narrow { tab.label_short() } else { tab.label() };
                Line::from(Span::styled(format!(" {} {label} ", tab.number()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(active.index());
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(input) = &self.filter {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::VIOLET)),
                Span::styled(input.value().to_owned(), Style::default().fg(theme::TEAL)),
                Span::styled("█", Style::default().fg(theme::TEAL)),
                Span::styled("  Enter keep  Esc clear", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let connection_indicator = match &self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::GREEN))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::AMBER))
            }
            ConnectionStatus::Disconnected(_) => {
                Span::styled("○ unreachable", Style::default().fg(theme::RED))
            }
        };

        let mut spans = vec![
            Span::raw(" "),
            connection_indicator,
            Span::styled(format!(" │ {}", self.route.path()), theme::value()),
            Span::styled(" │", theme::key_hint()),
        ];
        for (key, hint) in self.screen.key_hints() {
            spans.push(Span::styled(format!(" {key}"), theme::key_hint_key()));
            spans.push(Span::styled(format!(" {hint}"), theme::key_hint()));
        }
        if self.screen.accepts_filter() {
            spans.push(Span::styled(" /", theme::key_hint_key()));
            spans.push(Span::styled(" filter", theme::key_hint()));
        }
        spans.push(Span::styled(" │ ? help  q quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.data_cancel.cancel();
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 60, 24);
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::SKY)))
    };
    let row = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<11}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        section("Navigation"),
        row("1-7", "Jump to a collection"),
        row("Tab", "Next collection"),
        row("Enter", "Open record"),
        row("Esc", "Back"),
        row("u", "Parent record"),
        Line::from(""),
        section("Tables"),
        row("j/k ↑/↓", "Move cursor"),
        row("h/l  s", "Pick column, cycle sort"),
        row("< >", "Previous / next page"),
        row("+", "Cycle page size"),
        row("/", "Filter rows"),
        row("[ ]", "Related collection"),
        Line::from(""),
        section("Records"),
        row("n", "New record"),
        row("e", "Edit record"),
        row("d", "Delete record"),
        row("r", "Reload / retry"),
        Line::from(""),
        Line::from(Span::styled(
            "                      Esc or ? to close",
            theme::key_hint(),
        )),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmRequest) {
    let dialog_area = centered(area, 56, 6);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::AMBER))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(Span::styled(
            format!("  {}", confirm.message),
            Style::default().fg(theme::TEXT),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let msg_len = crate::widgets::text_width(&notification.message);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16;

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height.min(area.height));

    let (border_color, icon) = match notification.level {
        NotificationLevel::Success => (theme::GREEN, "✓"),
        NotificationLevel::Error => (theme::RED, "✗"),
        NotificationLevel::Info => (theme::SKY, "·"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notification.message.clone(), Style::default().fg(theme::TEXT)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
