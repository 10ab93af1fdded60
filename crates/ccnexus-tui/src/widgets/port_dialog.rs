//! Proxy port dialog. Pre-filled with the current port.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use ccnexus_core::validate_port;

use crate::theme;
use crate::widgets::text_field::TextField;
use crate::widgets::{centered, modal};

#[derive(Debug, PartialEq, Eq)]
pub enum PortOutcome {
    Open,
    Cancel,
    Submit(u32),
}

pub struct PortDialog {
    current: Option<u16>,
    input: TextField,
    error: Option<String>,
    submitting: bool,
}

impl PortDialog {
    pub fn new(current: Option<u16>) -> Self {
        let input = TextField::new("Port").digits_only();
        let input = match current {
            Some(port) => input.with_value(port.to_string()),
            None => input,
        };
        Self {
            current,
            input,
            error: None,
            submitting: false,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PortOutcome {
        if self.submitting {
            return PortOutcome::Open;
        }
        match key.code {
            KeyCode::Esc => PortOutcome::Cancel,
            KeyCode::Enter => self.submit(),
            _ => {
                self.input.handle_key(key);
                PortOutcome::Open
            }
        }
    }

    fn submit(&mut self) -> PortOutcome {
        let parsed = self.input.value().trim().parse::<u32>();
        let Ok(port) = parsed else {
            self.error = Some("Enter a port between 1 and 65535".into());
            return PortOutcome::Open;
        };
        if let Err(e) = validate_port(port) {
            self.error = Some(e.to_string());
            return PortOutcome::Open;
        }
        self.error = None;
        self.submitting = true;
        PortOutcome::Submit(port)
    }

    pub fn fail(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, throbber: &ThrobberState) {
        let dialog = centered(area, 52, 10);
        let inner = modal(frame, dialog, "Proxy Port", theme::border_focused());

        let rows = Layout::vertical([
            Constraint::Length(1), // current
            Constraint::Length(1), // spacer
            Constraint::Length(1), // input
            Constraint::Length(1), // spacer
            Constraint::Length(1), // status
            Constraint::Length(1), // restart note
            Constraint::Min(0),
            Constraint::Length(1), // hints
        ])
        .split(inner.inner(Margin::new(1, 0)));

        let current = self
            .current
            .map_or_else(|| "unknown".to_owned(), |p| p.to_string());
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Current   ", theme::key_hint()),
                Span::styled(current, theme::figure()),
            ])),
            rows[0],
        );

        self.input.render(frame, rows[2], !self.submitting);

        if self.submitting {
            let saving = Throbber::default()
                .label("Saving…")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(saving, rows[4], &mut throbber.clone());
        } else if let Some(ref error) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("✗ {error}"), theme::error_text())),
                rows[4],
            );
        }

        frame.render_widget(
            Paragraph::new(Span::styled(
                "Changing the port requires restarting ccNexus.",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            )),
            rows[5],
        );

        let hints = Line::from(vec![
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("save  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), rows[7]);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn prefilled_port_submits_as_is() {
        let mut dialog = PortDialog::new(Some(3000));
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), PortOutcome::Submit(3000));
    }

    #[test]
    fn out_of_range_stays_open() {
        let mut dialog = PortDialog::new(Some(3000));
        dialog.handle_key(key(KeyCode::Char('0')));
        dialog.handle_key(key(KeyCode::Char('0')));

        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), PortOutcome::Open);
        assert!(dialog.error().is_some_and(|e| e.contains("300000")));
    }

    #[test]
    fn empty_input_asks_for_a_port() {
        let mut dialog = PortDialog::new(None);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), PortOutcome::Open);
        assert_eq!(dialog.error(), Some("Enter a port between 1 and 65535"));
    }
}
