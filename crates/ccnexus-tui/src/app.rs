//! Application core: the event loop, screen switching and action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ccnexus_core::{CommandResult, ConnectionState, Console, DisplayModel, Position};

use crate::action::{Action, ConfirmAction, FormMode, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{centered, modal};

/// How long a toast stays up.
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection: ConnectionState,
    /// Why the last connect attempt failed, until one succeeds.
    connect_error: Option<String>,
    /// Latest model, for the status bar.
    model: Arc<DisplayModel>,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    console: Console,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    throbber_state: ThrobberState,
}

impl App {
    pub fn new(console: Console) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::default(),
            screens,
            running: true,
            connection: ConnectionState::Disconnected,
            connect_error: None,
            model: Arc::new(DisplayModel::default()),
            help_visible: false,
            action_tx,
            action_rx,
            console,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
            throbber_state: ThrobberState::default(),
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let bridge = tokio::spawn(crate::data_bridge::spawn_data_bridge(
            self.console.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        // The bridge disconnects the console on its way out.
        self.data_cancel.cancel();
        events.stop();
        if let Err(e) = bridge.await {
            warn!(error = %e, "data bridge task failed");
        }
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    fn active_captures_input(&self) -> bool {
        self.screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        // An open dialog owns every other key.
        if self.active_captures_input() {
            return match self.screens.get_mut(&self.active_screen) {
                Some(screen) => screen.handle_key_event(key),
                None => Ok(None),
            };
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (_, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Esc) if self.notification.is_some() => {
                return Ok(Some(Action::DismissNotification));
            }
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (_, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    /// Apply one action to app state and pass it on to the screens.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Resize(w, h) => debug!(width = w, height = h, "terminal resized"),

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Render => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                if self.connection == ConnectionState::Connecting {
                    self.throbber_state.calc_next();
                }
                self.forward_to(self.active_screen, action)?;
            }

            // ── Data ──────────────────────────────────────────────────
            Action::DisplayUpdated(model) => {
                self.model = Arc::clone(model);
                for screen in self.screens.values_mut() {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::ConnectionChanged(state) => {
                if *state == ConnectionState::Connected {
                    self.connect_error = None;
                }
                self.connection = *state;
            }

            Action::ConnectFailed(reason) => self.connect_error = Some(reason.clone()),

            Action::Refresh => self.refresh(),

            // ── Endpoint mutations ────────────────────────────────────
            Action::RequestEdit(position) => self.request_edit(*position),

            Action::SubmitEndpoint { mode, form } => {
                let console = self.console.clone();
                let tx = self.action_tx.clone();
                let mode = *mode;
                let form = form.clone();
                tokio::spawn(async move {
                    let name = form.name.clone();
                    let result = match mode {
                        FormMode::Add => console.add_endpoint(form).await,
                        FormMode::Edit(position) => console.update_endpoint(position, form).await,
                    };
                    let outcome = match result {
                        Ok(_) => {
                            let verb = if mode == FormMode::Add { "Added" } else { "Updated" };
                            let _ = tx.send(Action::Notify(Notification::success(format!(
                                "{verb} '{name}'"
                            ))));
                            Ok(name)
                        }
                        Err(e) => {
                            warn!(error = %e, "endpoint save failed");
                            Err(e.to_string())
                        }
                    };
                    let _ = tx.send(Action::EndpointFormResult(outcome));
                });
            }

            Action::RequestToggle { position, enabled } => {
                self.toggle(*position, *enabled);
            }

            Action::SubmitPort(port) => {
                let console = self.console.clone();
                let tx = self.action_tx.clone();
                let port = *port;
                tokio::spawn(async move {
                    let outcome = match console.update_port(port).await {
                        Ok(CommandResult::PortUpdated {
                            port,
                            restart_required,
                        }) => {
                            let message = if restart_required {
                                Notification::warning(format!(
                                    "Port set to {port}. Restart ccNexus to apply."
                                ))
                            } else {
                                Notification::success(format!("Port set to {port}"))
                            };
                            let _ = tx.send(Action::Notify(message));
                            Ok(port)
                        }
                        Ok(other) => {
                            warn!(?other, "unexpected result for a port update");
                            Err("unexpected response from host".to_owned())
                        }
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(Action::PortResult(outcome));
                });
            }

            Action::EditFormReady(_)
            | Action::EndpointFormResult(_)
            | Action::PortResult(_) => {
                self.forward_to(ScreenId::Endpoints, action)?;
            }

            // ── Confirmation ──────────────────────────────────────────
            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm);
                }
            }

            Action::ConfirmNo => self.pending_confirm = None,

            // ── Notifications ─────────────────────────────────────────
            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::DismissNotification => self.notification = None,
        }
        Ok(())
    }

    fn forward_to(&mut self, id: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&id) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    // ── Console calls ─────────────────────────────────────────────

    fn refresh(&self) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let (directory, telemetry) =
                tokio::join!(console.fetch_directory(), console.fetch_telemetry());
            if let Some(e) = directory.err().or(telemetry.err()) {
                let _ = tx.send(Action::Notify(Notification::error(format!(
                    "Refresh failed: {e}"
                ))));
            }
        });
    }

    fn request_edit(&self, position: Position) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match console.edit_form(position).await {
                Ok(draft) => {
                    let _ = tx.send(Action::EditFormReady(draft));
                }
                Err(e) => {
                    let _ = tx.send(Action::Notify(Notification::error(e.to_string())));
                }
            }
        });
    }

    /// The row flips at once through the store; a failure rolls it back
    /// there too, so only the message is left to report.
    fn toggle(&self, position: Position, enabled: bool) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let notification = match console.toggle_endpoint(position, enabled).await {
                Ok(CommandResult::Toggled { changed: false, .. }) => Some(Notification::info(
                    format!("Endpoint {position} was already {}", state_word(enabled)),
                )),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, %position, "toggle failed");
                    Some(Notification::error(format!(
                        "Could not {} endpoint: {e}",
                        if enabled { "enable" } else { "disable" }
                    )))
                }
            };
            if let Some(n) = notification {
                let _ = tx.send(Action::Notify(n));
            }
        });
    }

    fn execute_confirm(&self, confirm: ConfirmAction) {
        match confirm {
            ConfirmAction::RemoveEndpoint { position, name } => {
                let console = self.console.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let n = match console.remove_endpoint(position).await {
                        Ok(_) => Notification::success(format!("Removed '{name}'")),
                        Err(e) => Notification::error(format!("Could not remove '{name}': {e}")),
                    };
                    let _ = tx.send(Action::Notify(n));
                });
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }
        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        // Overlays, last is topmost.
        if let Some((ref notif, _)) = self.notification {
            render_notification(frame, area, notif);
        }
        if let Some(ref confirm) = self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = match self.connection {
            ConnectionState::Connected => vec![Span::styled(
                " ● connected",
                Style::default().fg(theme::SUCCESS_GREEN),
            )],
            ConnectionState::Unavailable => vec![Span::styled(
                " ◐ host unavailable",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            )],
            ConnectionState::Connecting => {
                let throbber = Throbber::default()
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                vec![
                    Span::raw(" "),
                    throbber.to_symbol_span(&self.throbber_state),
                    Span::styled("connecting", Style::default().fg(theme::NEON_CYAN)),
                ]
            }
            ConnectionState::Disconnected => vec![Span::styled(
                " ○ disconnected",
                Style::default().fg(theme::ERROR_RED),
            )],
        };

        if let Some(ref reason) = self.connect_error {
            spans.push(Span::styled(format!("  {reason}"), theme::error_text()));
        } else if let Some(age) = self.telemetry_age() {
            spans.push(Span::styled(format!("  updated {age} ago"), theme::key_hint()));
        }

        spans.extend([
            Span::styled("   ? ", theme::key_hint_key()),
            Span::styled("help  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Seconds since the last telemetry fetch, for the status bar.
    fn telemetry_age(&self) -> Option<String> {
        let fetched = self.model.telemetry_fetched_at?;
        let secs = (Utc::now() - fetched).num_seconds().max(0);
        let age = Duration::from_secs(u64::try_from(secs).unwrap_or(0));
        Some(humantime::format_duration(age).to_string())
    }
}

fn state_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let dialog = centered(area, 56, 23);
    let inner = modal(frame, dialog, "Keyboard Shortcuts", theme::border_focused());

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(theme::NEON_CYAN),
        ))
    };
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        section("Navigation"),
        entry("1-2 Tab", "Switch screen"),
        entry("j/k ↑/↓", "Move up/down"),
        entry("g/G", "Top / bottom"),
        entry("Ctrl+d/u", "Page down / up"),
        Line::from(""),
        section("Endpoints"),
        entry("a", "Add endpoint"),
        entry("e Enter", "Edit endpoint"),
        entry("d Del", "Delete endpoint"),
        entry("space", "Enable / disable"),
        entry("p", "Change proxy port"),
        entry("r", "Refresh now"),
        Line::from(""),
        section("Global"),
        entry("?", "This help"),
        entry("q Ctrl+C", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let dialog = centered(area, 60, 5);
    let inner = modal(
        frame,
        dialog,
        "Confirm",
        Style::default().fg(theme::ELECTRIC_YELLOW),
    );

    let text = vec![
        Line::from(Span::styled(
            format!(" {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 70).min(area.width);
    let height = 3u16;

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = match notif.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    let inner = modal(frame, toast_area, "", Style::default().fg(border_color));
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
