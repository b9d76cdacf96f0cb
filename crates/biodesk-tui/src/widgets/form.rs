//! Modal create / edit form.
//!
//! Wraps a [`FormModel`] with one [`Input`] per field. `Tab`/`↓` and
//! `BackTab`/`↑` move between editable fields, `Space` cycles a toggle,
//! `Enter` submits and `Esc` cancels. Submitting answers the opener's
//! oneshot with the payload; cancelling answers `None`.

use biodesk_core::{FieldSpec, FormModel, InputKind, Payload};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tokio::sync::oneshot;
use tui_input::{Input, InputRequest};

use super::{centered, text_width};
use crate::dialog::FormRequest;
use crate::theme;

/// Whether the modal is still open after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Open,
    Closed,
}

#[derive(Debug)]
pub struct FormModal {
    form: FormModel,
    reply: Option<oneshot::Sender<Option<Payload>>>,
    /// Parallel to `form.fields()`.
    inputs: Vec<Input>,
    focus: usize,
    error: Option<String>,
}

impl FormModal {
    pub fn new(request: FormRequest) -> Self {
        let FormRequest { form, reply } = request;
        let inputs = form
            .fields()
            .iter()
            .map(|field| Input::new(form.value(field.key).to_owned()))
            .collect();
        let focus = form
            .fields()
            .iter()
            .position(|field| form.is_editable(field))
            .unwrap_or(0);
        Self {
            form,
            reply: Some(reply),
            inputs,
            focus,
            error: None,
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.form.fields().get(self.focus)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        let Some(field) = self.focused_field() else {
            return match key.code {
                KeyCode::Esc => self.close(None),
                _ => FormOutcome::Open,
            };
        };

        match key.code {
            KeyCode::Esc => return self.close(None),
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
                if field.input == InputKind::Toggle =>
            {
                self.form.cycle_toggle(field.key);
                self.inputs[self.focus] = Input::new(self.form.value(field.key).to_owned());
                self.error = None;
            }
            _ if field.input == InputKind::Toggle => {}
            code => {
                if let Some(request) = input_request(code, key.modifiers) {
                    self.edit(request);
                }
            }
        }
        FormOutcome::Open
    }

    /// Insert pasted text into the focused text field.
    pub fn paste(&mut self, text: &str) {
        let is_text = self
            .focused_field()
            .is_some_and(|field| field.input != InputKind::Toggle);
        if !is_text {
            return;
        }
        for c in text.chars().filter(|c| !c.is_control()) {
            let _ = self.inputs[self.focus].handle(InputRequest::InsertChar(c));
        }
        self.sync_focused();
    }

    fn edit(&mut self, request: InputRequest) {
        if self.inputs[self.focus].handle(request).is_some() {
            self.sync_focused();
        }
    }

    fn sync_focused(&mut self) {
        if let Some(field) = self.focused_field() {
            let value = self.inputs[self.focus].value().to_owned();
            self.form.set_value(field.key, value);
            self.error = None;
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let editable: Vec<usize> = self
            .form
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| self.form.is_editable(field))
            .map(|(i, _)| i)
            .collect();
        let Some(pos) = editable.iter().position(|&i| i == self.focus) else {
            return;
        };
        let len = editable.len();
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        self.focus = editable[next];
    }

    fn submit(&mut self) -> FormOutcome {
        let missing = self.form.missing_required();
        if !missing.is_empty() {
            self.error = Some(format!("Required: {}", missing.join(", ")));
            return FormOutcome::Open;
        }
        match self.form.payload() {
            Ok(payload) => self.close(Some(payload)),
            Err(e) => {
                if let Some(i) = self.form.fields().iter().position(|f| f.label == e.label) {
                    self.focus = i;
                }
                self.error = Some(e.to_string());
                FormOutcome::Open
            }
        }
    }

    fn close(&mut self, payload: Option<Payload>) -> FormOutcome {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(payload);
        }
        FormOutcome::Closed
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let fields = self.form.fields();
        let rows = u16::try_from(fields.len()).unwrap_or(u16::MAX);
        let popup = centered(area, 72, rows.saturating_add(6));
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(format!(" {} ", self.form.title()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [fields_area, _, error_area, hint_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let label_width = fields
            .iter()
            .map(|f| text_width(f.label).saturating_add(2))
            .max()
            .unwrap_or(0);
        let visible = usize::from(fields_area.height).max(1);
        let first = (self.focus + 1).saturating_sub(visible);

        for (row, (i, field)) in fields.iter().enumerate().skip(first).take(visible).enumerate() {
            let y = fields_area.y + u16::try_from(row).unwrap_or(u16::MAX);
            let line_area = Rect::new(fields_area.x, y, fields_area.width, 1);
            let [label_area, value_area] = Layout::horizontal([
                Constraint::Length(label_width.saturating_add(2)),
                Constraint::Min(1),
            ])
            .areas(line_area);

            let focused = i == self.focus;
            let marker = if focused { "› " } else { "  " };
            let required = if field.required { "*" } else { "" };
            let label_style = if focused {
                theme::tab_active()
            } else {
                theme::label()
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(marker, theme::tab_active()),
                    Span::styled(format!("{}{required}", field.label), label_style),
                ])),
                label_area,
            );

            let input = &self.inputs[i];
            if !self.form.is_editable(field) {
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled(input.value().to_owned(), theme::label()),
                        Span::styled("  (locked)", theme::key_hint()),
                    ])),
                    value_area,
                );
            } else if field.input == InputKind::Toggle {
                frame.render_widget(
                    Paragraph::new(Span::styled(toggle_text(input.value()), theme::value())),
                    value_area,
                );
            } else {
                let width = usize::from(value_area.width.max(1)) - 1;
                let scroll = input.visual_scroll(width);
                let style = if focused {
                    theme::value().add_modifier(Modifier::UNDERLINED)
                } else {
                    theme::value()
                };
                frame.render_widget(
                    Paragraph::new(Span::styled(input.value().to_owned(), style))
                        .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX))),
                    value_area,
                );
                if focused {
                    let cursor = input.visual_cursor().saturating_sub(scroll);
                    let x = value_area.x + u16::try_from(cursor).unwrap_or(u16::MAX);
                    frame.set_cursor_position(Position::new(x.min(value_area.right()), y));
                }
            }
        }

        if let Some(error) = self.error() {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("  {error}"), theme::error())),
                error_area,
            );
        }

        let submit = if self.form.can_submit() {
            theme::key_hint_key()
        } else {
            theme::key_hint()
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Enter ", submit),
                Span::styled(format!("{}  ", self.form.submit_label()), theme::key_hint()),
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("next  ", theme::key_hint()),
                Span::styled("Space ", theme::key_hint_key()),
                Span::styled("toggle  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])),
            hint_area,
        );
    }
}

fn toggle_text(value: &str) -> &'static str {
    match value {
        "true" => "[✓] yes",
        "false" => "[✗] no",
        _ => "[ ] unset",
    }
}

fn input_request(code: KeyCode, modifiers: KeyModifiers) -> Option<InputRequest> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let request = match code {
        KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
        KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::Char(c) => InputRequest::InsertChar(c),
        KeyCode::Backspace => InputRequest::DeletePrevChar,
        KeyCode::Delete => InputRequest::DeleteNextChar,
        KeyCode::Left => InputRequest::GoToPrevChar,
        KeyCode::Right => InputRequest::GoToNextChar,
        KeyCode::Home => InputRequest::GoToStart,
        KeyCode::End => InputRequest::GoToEnd,
        _ => return None,
    };
    Some(request)
}
