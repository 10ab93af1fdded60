//! Single-line labelled text field on top of `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_input::{Input, InputRequest};

use crate::theme;

/// Columns reserved for the label in front of the value.
const LABEL_WIDTH: u16 = 10;

pub struct TextField {
    label: &'static str,
    input: Input,
    masked: bool,
    digits_only: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
            masked: false,
            digits_only: false,
        }
    }

    /// Pre-fill with `value`, cursor at the end.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input = Input::new(value.into());
        self
    }

    /// Show bullets instead of the value.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn digits_only(mut self) -> Self {
        self.digits_only = true;
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Apply an editing key. Returns false for keys the field ignores.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(request) = edit_request(key, self.digits_only) else {
            return false;
        };
        let _ = self.input.handle(request);
        true
    }

    fn display_text(&self) -> String {
        if self.masked {
            "•".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_owned()
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let (label_style, value_style) = if focused {
            (theme::key_hint_key(), Style::default().fg(theme::NEON_CYAN).bg(theme::BG_HIGHLIGHT))
        } else {
            (theme::key_hint(), theme::table_row())
        };

        let value_width = usize::from(area.width.saturating_sub(LABEL_WIDTH));
        let scroll = self.input.visual_scroll(value_width.saturating_sub(1));
        let shown: String = self
            .display_text()
            .chars()
            .skip(scroll)
            .take(value_width)
            .collect();
        let padding = " ".repeat(value_width.saturating_sub(shown.chars().count()));

        let line = Line::from(vec![
            Span::styled(
                format!("{:<width$}", self.label, width = usize::from(LABEL_WIDTH)),
                label_style,
            ),
            Span::styled(format!("{shown}{padding}"), value_style),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        if focused {
            let offset = self.input.visual_cursor().saturating_sub(scroll);
            let x = area
                .x
                .saturating_add(LABEL_WIDTH)
                .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
                .min(area.right().saturating_sub(1));
            frame.set_cursor_position((x, area.y));
        }
    }
}

/// Map a key to a `tui-input` edit, independent of the input backend.
fn edit_request(key: KeyEvent, digits_only: bool) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char('a') if ctrl => Some(InputRequest::GoToStart),
        KeyCode::Char('e') if ctrl => Some(InputRequest::GoToEnd),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) if digits_only && !c.is_ascii_digit() => None,
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}
