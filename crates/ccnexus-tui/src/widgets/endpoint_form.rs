//! Add / edit endpoint dialog.
//!
//! The dialog validates locally before emitting `SubmitEndpoint`, then
//! stays open in a submitting state until the host answers. A failure
//! re-enables the form and shows the error inline; success closes it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use secrecy::ExposeSecret;
use throbber_widgets_tui::{Throbber, ThrobberState};

use ccnexus_core::{CoreError, EditDraft, EndpointForm};

use crate::action::{Action, FormMode};
use crate::theme;
use crate::widgets::text_field::TextField;
use crate::widgets::{centered, modal};

/// What a key press did to the form.
#[derive(Debug)]
pub enum FormOutcome {
    /// Still editing (or waiting for the host).
    Open,
    Cancel,
    Submit(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    ApiUrl,
    ApiKey,
}

impl FormField {
    const ALL: [Self; 3] = [Self::Name, Self::ApiUrl, Self::ApiKey];

    fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::ApiUrl => "API URL",
            Self::ApiKey => "API key",
        }
    }

    /// Field named by a `CoreError::Validation`.
    fn from_validation(field: &str) -> Option<Self> {
        match field {
            "name" => Some(Self::Name),
            "apiUrl" => Some(Self::ApiUrl),
            "apiKey" => Some(Self::ApiKey),
            _ => None,
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct EndpointFormDialog {
    mode: FormMode,
    name: TextField,
    api_url: TextField,
    api_key: TextField,
    active: FormField,
    error: Option<String>,
    submitting: bool,
}

impl EndpointFormDialog {
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            name: TextField::new("Name"),
            api_url: TextField::new("API URL"),
            api_key: TextField::new("API key").masked(),
            active: FormField::Name,
            error: None,
            submitting: false,
        }
    }

    /// Pre-populated with the endpoint's current values, full key included.
    pub fn edit(draft: &EditDraft) -> Self {
        Self {
            mode: FormMode::Edit(draft.position),
            name: TextField::new("Name").with_value(draft.form.name.clone()),
            api_url: TextField::new("API URL").with_value(draft.form.api_url.clone()),
            api_key: TextField::new("API key")
                .with_value(draft.form.api_key.expose_secret())
                .masked(),
            active: FormField::Name,
            error: None,
            submitting: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn active_field(&self) -> FormField {
        self.active
    }

    fn field(&self, field: FormField) -> &TextField {
        match field {
            FormField::Name => &self.name,
            FormField::ApiUrl => &self.api_url,
            FormField::ApiKey => &self.api_key,
        }
    }

    fn field_mut(&mut self, field: FormField) -> &mut TextField {
        match field {
            FormField::Name => &mut self.name,
            FormField::ApiUrl => &mut self.api_url,
            FormField::ApiKey => &mut self.api_key,
        }
    }

    fn form(&self) -> EndpointForm {
        EndpointForm::new(self.name.value(), self.api_url.value(), self.api_key.value())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        if self.submitting {
            return FormOutcome::Open;
        }
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => FormOutcome::Cancel,
            (_, KeyCode::Enter) => self.submit(),
            (_, KeyCode::Tab | KeyCode::Down) => {
                self.active = self.active.next();
                FormOutcome::Open
            }
            (_, KeyCode::BackTab | KeyCode::Up) => {
                self.active = self.active.prev();
                FormOutcome::Open
            }
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                let masked = self.api_key.is_masked();
                self.api_key.set_masked(!masked);
                FormOutcome::Open
            }
            _ => {
                let active = self.active;
                self.field_mut(active).handle_key(key);
                FormOutcome::Open
            }
        }
    }

    fn submit(&mut self) -> FormOutcome {
        match self.form().validate() {
            Ok(form) => {
                self.error = None;
                self.submitting = true;
                FormOutcome::Submit(Action::SubmitEndpoint {
                    mode: self.mode,
                    form,
                })
            }
            Err(CoreError::Validation { field, message }) => {
                match FormField::from_validation(&field) {
                    Some(f) => {
                        self.active = f;
                        self.error = Some(format!("{} {message}", f.label()));
                    }
                    None => self.error = Some(format!("{field} {message}")),
                }
                FormOutcome::Open
            }
            Err(e) => {
                self.error = Some(e.to_string());
                FormOutcome::Open
            }
        }
    }

    /// The host refused: re-enable editing and show why.
    pub fn fail(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, throbber: &ThrobberState) {
        let title = match self.mode {
            FormMode::Add => "Add Endpoint".to_owned(),
            FormMode::Edit(position) => format!("Edit Endpoint {position}"),
        };
        let dialog = centered(area, 64, 11);
        let inner = modal(frame, dialog, &title, theme::border_focused());

        let rows = Layout::vertical([
            Constraint::Length(1), // spacer
            Constraint::Length(1), // name
            Constraint::Length(1), // url
            Constraint::Length(1), // key
            Constraint::Length(1), // spacer
            Constraint::Length(1), // status
            Constraint::Min(0),
            Constraint::Length(1), // hints
        ])
        .split(inner.inner(ratatui::layout::Margin::new(1, 0)));

        for (field, row) in FormField::ALL.into_iter().zip(rows.iter().skip(1)) {
            let focused = !self.submitting && field == self.active;
            self.field(field).render(frame, *row, focused);
        }

        if self.submitting {
            let saving = Throbber::default()
                .label("Saving…")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(saving, rows[5], &mut throbber.clone());
        } else if let Some(ref error) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("✗ {error}"), theme::error_text())),
                rows[5],
            );
        }

        let hints = Line::from(vec![
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("save  ", theme::key_hint()),
            Span::styled("Tab ", theme::key_hint_key()),
            Span::styled("next field  ", theme::key_hint()),
            Span::styled("^R ", theme::key_hint_key()),
            Span::styled("show key  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), rows[7]);
    }
}

#[cfg(test)]
mod tests {
    use ccnexus_core::Position;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(dialog: &mut EndpointFormDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn blank_url_focuses_the_url_field() {
        let mut dialog = EndpointFormDialog::add();
        type_text(&mut dialog, "Primary");
        dialog.handle_key(key(KeyCode::Tab));
        dialog.handle_key(key(KeyCode::Tab));
        type_text(&mut dialog, "sk-1");

        let outcome = dialog.handle_key(key(KeyCode::Enter));

        assert!(matches!(outcome, FormOutcome::Open));
        assert_eq!(dialog.active_field(), FormField::ApiUrl);
        assert_eq!(dialog.error(), Some("API URL must not be empty"));
        assert!(!dialog.is_submitting());
    }

    #[test]
    fn valid_form_submits_trimmed_values() {
        let mut dialog = EndpointFormDialog::add();
        type_text(&mut dialog, " Primary ");
        dialog.handle_key(key(KeyCode::Tab));
        type_text(&mut dialog, "https://api.example");
        dialog.handle_key(key(KeyCode::Tab));
        type_text(&mut dialog, "sk-1");

        let FormOutcome::Submit(Action::SubmitEndpoint { mode, form }) =
            dialog.handle_key(key(KeyCode::Enter))
        else {
            panic!("expected a submission");
        };
        assert_eq!(mode, FormMode::Add);
        assert_eq!(form.name, "Primary");
        assert!(dialog.is_submitting());
    }

    #[test]
    fn keys_are_ignored_while_submitting_and_failure_reopens() {
        let draft = EditDraft {
            position: Position::new(1, 4),
            form: EndpointForm::new("B", "https://b.example", "sk-b"),
            enabled: true,
        };
        let mut dialog = EndpointFormDialog::edit(&draft);
        assert!(matches!(
            dialog.handle_key(key(KeyCode::Enter)),
            FormOutcome::Submit(_)
        ));
        assert!(matches!(
            dialog.handle_key(key(KeyCode::Esc)),
            FormOutcome::Open
        ));

        dialog.fail("endpoint 'B' already exists".into());
        assert!(!dialog.is_submitting());
        assert_eq!(dialog.error(), Some("endpoint 'B' already exists"));
        assert!(matches!(
            dialog.handle_key(key(KeyCode::Esc)),
            FormOutcome::Cancel
        ));
    }

    #[test]
    fn edit_prefills_the_full_key() {
        let draft = EditDraft {
            position: Position::new(0, 1),
            form: EndpointForm::new("A", "https://a.example", "sk-abcdef1234"),
            enabled: false,
        };
        let dialog = EndpointFormDialog::edit(&draft);
        assert_eq!(dialog.mode(), FormMode::Edit(Position::new(0, 1)));
        assert_eq!(dialog.field(FormField::ApiKey).value(), "sk-abcdef1234");
    }
}
