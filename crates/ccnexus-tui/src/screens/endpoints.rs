//! Endpoints screen: the endpoint list with its mutation dialogs.
//!
//! Keys: `a` add, `e` edit, `d` delete, `space` enable/disable, `p` port,
//! `r` refresh. Add, edit and port open a dialog that owns the keyboard
//! until it closes.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};

use ccnexus_core::{DisplayBody, DisplayModel, EndpointRow, TogglePhase};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::endpoint_form::{EndpointFormDialog, FormOutcome};
use crate::widgets::port_dialog::{PortDialog, PortOutcome};

enum Dialog {
    Form(EndpointFormDialog),
    Port(PortDialog),
}

pub struct EndpointsScreen {
    focused: bool,
    model: Arc<DisplayModel>,
    table_state: TableState,
    dialog: Option<Dialog>,
    throbber: ThrobberState,
}

/// Status column text and colour. A pending toggle already shows its
/// target value.
fn status(row: &EndpointRow) -> (&'static str, Color) {
    match (row.toggle, row.enabled) {
        (TogglePhase::Pending, true) => ("◐ enabling", theme::ELECTRIC_YELLOW),
        (TogglePhase::Pending, false) => ("◐ disabling", theme::ELECTRIC_YELLOW),
        (_, true) => ("● enabled", theme::SUCCESS_GREEN),
        (_, false) => ("○ disabled", theme::ERROR_RED),
    }
}

/// Text of every table column for one row.
fn row_cells(row: &EndpointRow) -> [String; 7] {
    [
        row.position.index().to_string(),
        status(row).0.to_owned(),
        row.name.clone(),
        row.api_url.clone(),
        row.masked_key.clone(),
        format!("{}/{}", row.stats.requests, row.stats.errors),
        row.total_tokens_display.clone(),
    ]
}

impl EndpointsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            model: Arc::new(DisplayModel::default()),
            table_state: TableState::default().with_selected(Some(0)),
            dialog: None,
            throbber: ThrobberState::default(),
        }
    }

    fn selected_row(&self) -> Option<&EndpointRow> {
        self.model.row(self.table_state.selected().unwrap_or(0))
    }

    fn select(&mut self, idx: usize) {
        let len = self.model.rows().len();
        let clamped = if len == 0 { 0 } else { idx.min(len - 1) };
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        let current = self.table_state.selected().unwrap_or(0);
        self.select(current.saturating_add_signed(delta));
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        match self.dialog.as_mut()? {
            Dialog::Form(form) => match form.handle_key(key) {
                FormOutcome::Open => None,
                FormOutcome::Cancel => {
                    self.dialog = None;
                    None
                }
                FormOutcome::Submit(action) => Some(action),
            },
            Dialog::Port(port) => match port.handle_key(key) {
                PortOutcome::Open => None,
                PortOutcome::Cancel => {
                    self.dialog = None;
                    None
                }
                PortOutcome::Submit(port) => Some(Action::SubmitPort(port)),
            },
        }
    }

    fn toggle_selected(&self) -> Option<Action> {
        let row = self.selected_row()?;
        if row.toggle == TogglePhase::Pending {
            return Some(Action::Notify(Notification::info(format!(
                "'{}' is still switching",
                row.name
            ))));
        }
        Some(Action::RequestToggle {
            position: row.position,
            enabled: !row.enabled,
        })
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let m = &self.model;
        let port = m.port.map_or_else(|| "-".to_owned(), |p| p.to_string());
        let mut spans = vec![
            Span::styled(" Total requests ", theme::key_hint()),
            Span::styled(m.total_requests.to_string(), theme::figure()),
            Span::styled("  ·  Endpoints ", theme::key_hint()),
            Span::styled(m.endpoint_count.to_string(), theme::figure()),
            Span::styled(format!(" ({} enabled)", m.enabled_count), theme::table_row()),
            Span::styled("  ·  Port ", theme::key_hint()),
            Span::styled(port, theme::figure()),
            Span::styled(" (p)", theme::key_hint()),
        ];
        if m.last_error.is_some() && matches!(m.body, DisplayBody::Rows { .. }) {
            spans.push(Span::styled("  ⚠ last refresh failed", theme::error_text()));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_notice(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let height = u16::try_from(lines.len()).unwrap_or(1);
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            middle,
        );
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["#", "Status", "Name", "URL", "Key", "Req/Err", "Tokens"])
            .style(theme::table_header());

        let rows: Vec<Row> = self
            .model
            .rows()
            .iter()
            .map(|row| {
                let [index, status_text, name, url, key, req_err, tokens] = row_cells(row);
                let status_color = status(row).1;
                Row::new(vec![
                    Cell::from(index).style(theme::key_hint()),
                    Cell::from(status_text).style(Style::default().fg(status_color)),
                    Cell::from(name).style(
                        Style::default()
                            .fg(theme::NEON_CYAN)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::from(url).style(Style::default().fg(theme::CORAL)),
                    Cell::from(key).style(theme::table_row()),
                    Cell::from(req_err).style(theme::table_row()),
                    Cell::from(tokens).style(Style::default().fg(theme::ELECTRIC_YELLOW)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Fill(2),
            Constraint::Fill(3),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let lines = vec![
            Line::from(Span::styled(format!(" {}", row.requests_line()), theme::table_row())),
            Line::from(Span::styled(format!(" {}", row.tokens_line()), theme::table_row())),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Endpoints ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.model.body {
            DisplayBody::Loading => {
                let [_, middle, _] = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(1),
                    Constraint::Fill(1),
                ])
                .areas(inner);
                let loading = Throbber::default()
                    .label("Loading endpoints…")
                    .style(theme::table_row())
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                frame.render_stateful_widget(loading, middle, &mut self.throbber.clone());
            }
            DisplayBody::Unavailable { reason } => Self::render_notice(
                frame,
                inner,
                vec![
                    Line::from(Span::styled("ccNexus host unavailable", theme::error_text())),
                    Line::from(Span::styled(reason.clone(), theme::table_row())),
                    Line::from(Span::styled("Retrying automatically.", theme::key_hint())),
                ],
            ),
            DisplayBody::Empty => Self::render_notice(
                frame,
                inner,
                vec![
                    Line::from(Span::styled("No endpoints configured.", theme::table_row())),
                    Line::from(vec![
                        Span::styled("Press ", theme::key_hint()),
                        Span::styled("a", theme::key_hint_key()),
                        Span::styled(" to add one.", theme::key_hint()),
                    ]),
                ],
            ),
            DisplayBody::Rows { .. } => {
                let [table_area, detail_area] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);
                self.render_table(frame, table_area);
                self.render_detail(frame, detail_area);
            }
        }
    }
}

impl Component for EndpointsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.dialog.is_some() {
            return Ok(self.handle_dialog_key(key));
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.select(0);
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.select(usize::MAX);
                None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
                None
            }
            KeyCode::Char('a') => {
                self.dialog = Some(Dialog::Form(EndpointFormDialog::add()));
                None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.selected_row().map(|row| Action::RequestEdit(row.position))
            }
            KeyCode::Char('d') | KeyCode::Delete => self.selected_row().map(|row| {
                Action::ShowConfirm(ConfirmAction::RemoveEndpoint {
                    position: row.position,
                    name: row.name.clone(),
                })
            }),
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('p') => {
                self.dialog = Some(Dialog::Port(PortDialog::new(self.model.port)));
                None
            }
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DisplayUpdated(model) => {
                self.model = Arc::clone(model);
                self.select(self.table_state.selected().unwrap_or(0));
            }
            Action::EditFormReady(draft) => {
                self.dialog = Some(Dialog::Form(EndpointFormDialog::edit(draft)));
            }
            Action::EndpointFormResult(result) => {
                if let Some(Dialog::Form(form)) = self.dialog.as_mut() {
                    match result {
                        Ok(_) => self.dialog = None,
                        Err(message) => form.fail(message.clone()),
                    }
                }
            }
            Action::PortResult(result) => {
                if let Some(Dialog::Port(port)) = self.dialog.as_mut() {
                    match result {
                        Ok(_) => self.dialog = None,
                        Err(message) => port.fail(message.clone()),
                    }
                }
            }
            Action::Tick => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [header_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header_area);
        self.render_body(frame, body_area);

        let hints = Line::from(vec![
            Span::styled("  a ", theme::key_hint_key()),
            Span::styled("add  ", theme::key_hint()),
            Span::styled("e ", theme::key_hint_key()),
            Span::styled("edit  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete  ", theme::key_hint()),
            Span::styled("space ", theme::key_hint_key()),
            Span::styled("enable/disable  ", theme::key_hint()),
            Span::styled("p ", theme::key_hint_key()),
            Span::styled("port  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);

        match &self.dialog {
            Some(Dialog::Form(form)) => form.render(frame, area, &self.throbber),
            Some(Dialog::Port(port)) => port.render(frame, area, &self.throbber),
            None => {}
        }
    }

    fn captures_input(&self) -> bool {
        self.dialog.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ccnexus_core::{EditDraft, EndpointForm, Position};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::screens::fixtures;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_with_rows() -> EndpointsScreen {
        let mut screen = EndpointsScreen::new();
        screen
            .update(&Action::DisplayUpdated(Arc::new(fixtures::model())))
            .unwrap();
        screen
    }

    #[test]
    fn cells_show_masked_key_and_counters() {
        let model = fixtures::model();
        let cells = row_cells(&model.rows()[0]);
        assert_eq!(
            cells,
            [
                "0".to_owned(),
                "● enabled".to_owned(),
                "A".to_owned(),
                "https://a.example".to_owned(),
                "****1234".to_owned(),
                "10/1".to_owned(),
                "2.0K".to_owned(),
            ]
        );
    }

    #[test]
    fn pending_toggle_shows_target() {
        let mut row = fixtures::model().rows()[1].clone();
        row.enabled = true;
        row.toggle = TogglePhase::Pending;
        assert_eq!(status(&row).0, "◐ enabling");
    }

    #[test]
    fn space_toggles_the_selected_row() {
        let mut screen = screen_with_rows();
        screen.handle_key_event(key(KeyCode::Down)).unwrap();

        let action = screen.handle_key_event(key(KeyCode::Char(' '))).unwrap();
        let Some(Action::RequestToggle { position, enabled }) = action else {
            panic!("expected a toggle request");
        };
        assert_eq!(position.index(), 1);
        assert!(enabled, "row B is disabled, so space enables it");
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut screen = screen_with_rows();
        let action = screen.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert!(matches!(
            action,
            Some(Action::ShowConfirm(ConfirmAction::RemoveEndpoint { ref name, .. })) if name == "A"
        ));
    }

    #[test]
    fn edit_requests_a_fresh_draft() {
        let mut screen = screen_with_rows();
        let action = screen.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert!(matches!(action, Some(Action::RequestEdit(p)) if p.index() == 0));
        assert!(!screen.captures_input(), "the form opens once the draft arrives");

        let draft = EditDraft {
            position: Position::new(0, 1),
            form: EndpointForm::new("A", "https://a.example", "sk-abcdef1234"),
            enabled: true,
        };
        screen.update(&Action::EditFormReady(draft)).unwrap();
        assert!(screen.captures_input());
    }

    #[test]
    fn form_stays_open_on_failure_and_closes_on_success() {
        let mut screen = screen_with_rows();
        screen.handle_key_event(key(KeyCode::Char('a'))).unwrap();
        assert!(screen.captures_input());

        screen
            .update(&Action::EndpointFormResult(Err("name taken".into())))
            .unwrap();
        assert!(screen.captures_input());

        screen
            .update(&Action::EndpointFormResult(Ok("added".into())))
            .unwrap();
        assert!(!screen.captures_input());
    }

    #[test]
    fn dialog_owns_the_keyboard() {
        let mut screen = screen_with_rows();
        screen.handle_key_event(key(KeyCode::Char('a'))).unwrap();

        // 'd' types into the name field instead of deleting a row.
        let action = screen.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert!(action.is_none());

        screen.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!screen.captures_input());
    }

    #[test]
    fn port_dialog_submits_prefilled_port() {
        let mut screen = screen_with_rows();
        screen.handle_key_event(key(KeyCode::Char('p'))).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::SubmitPort(3000))));

        screen.update(&Action::PortResult(Ok(3000))).unwrap();
        assert!(!screen.captures_input());
    }

    #[test]
    fn selection_clamps_when_rows_disappear() {
        let mut screen = screen_with_rows();
        screen.handle_key_event(key(KeyCode::Char('G'))).unwrap();
        assert_eq!(screen.table_state.selected(), Some(1));

        screen
            .update(&Action::DisplayUpdated(Arc::new(fixtures::model_with(&["A"]))))
            .unwrap();
        assert_eq!(screen.table_state.selected(), Some(0));
    }
}
