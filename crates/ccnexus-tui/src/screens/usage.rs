//! Usage screen: per-endpoint counters ranked by traffic.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use ccnexus_core::{DisplayModel, EndpointRow, format_tokens};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::share_bar::{fraction, share_bar};

const BAR_WIDTH: usize = 16;

pub struct UsageScreen {
    focused: bool,
    model: Arc<DisplayModel>,
    table_state: TableState,
}

/// Rows ordered by request count, busiest first, then by name.
fn usage_rows(model: &DisplayModel) -> Vec<&EndpointRow> {
    let mut rows: Vec<&EndpointRow> = model.rows().iter().collect();
    rows.sort_by(|a, b| {
        b.stats
            .requests
            .cmp(&a.stats.requests)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

impl UsageScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            model: Arc::new(DisplayModel::default()),
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.model.rows().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }
}

impl Component for UsageScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') | KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX),
            KeyCode::Char('r') => return Ok(Some(Action::Refresh)),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::DisplayUpdated(model) = action {
            self.model = Arc::clone(model);
            let len = self.model.rows().len();
            let selected = self.table_state.selected().unwrap_or(0);
            self.table_state
                .select(Some(selected.min(len.saturating_sub(1))));
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Usage ")
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

        let [summary_area, table_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).areas(inner);

        let rows = usage_rows(&self.model);
        let total_tokens: u64 = rows.iter().map(|r| r.total_tokens).sum();
        let total_errors: u64 = rows.iter().map(|r| r.stats.errors).sum();

        let summary = Line::from(vec![
            Span::styled(" Requests ", theme::key_hint()),
            Span::styled(self.model.total_requests.to_string(), theme::figure()),
            Span::styled("   Errors ", theme::key_hint()),
            Span::styled(total_errors.to_string(), theme::figure()),
            Span::styled("   Tokens ", theme::key_hint()),
            Span::styled(format_tokens(total_tokens), theme::figure()),
        ]);
        frame.render_widget(Paragraph::new(summary), summary_area);

        if rows.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("No usage to show.", theme::key_hint()))
                    .alignment(Alignment::Center),
                table_area,
            );
            return;
        }

        let header = Row::new([
            "Name", "Status", "Requests", "Errors", "In", "Out", "Total", "Share",
        ])
        .style(theme::table_header());

        let table_rows: Vec<Row> = rows
            .iter()
            .map(|row| {
                let (status, color) = if row.enabled {
                    ("on", theme::SUCCESS_GREEN)
                } else {
                    ("off", theme::ERROR_RED)
                };
                let error_style = if row.stats.errors > 0 {
                    theme::error_text()
                } else {
                    theme::table_row()
                };
                Row::new(vec![
                    Cell::from(row.name.clone()).style(
                        Style::default()
                            .fg(theme::NEON_CYAN)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::from(status).style(Style::default().fg(color)),
                    Cell::from(row.stats.requests.to_string()).style(theme::table_row()),
                    Cell::from(row.stats.errors.to_string()).style(error_style),
                    Cell::from(row.input_tokens_display.clone()).style(theme::table_row()),
                    Cell::from(row.output_tokens_display.clone()).style(theme::table_row()),
                    Cell::from(row.total_tokens_display.clone())
                        .style(Style::default().fg(theme::ELECTRIC_YELLOW)),
                    Cell::from(share_bar(fraction(row.total_tokens, total_tokens), BAR_WIDTH))
                        .style(Style::default().fg(theme::ELECTRIC_PURPLE)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(u16::try_from(BAR_WIDTH).unwrap_or(16)),
        ];

        let table = Table::new(table_rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
