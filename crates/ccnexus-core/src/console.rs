// ── Console ──
//
// Full lifecycle management for a console session against one ccNexus
// host. Handles client construction, the telemetry poll, the directory
// refresh, command routing, and publishing through the SnapshotStore.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use strum::Display;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ccnexus_api::transport::{TlsMode, TransportConfig};
use ccnexus_api::HostClient;

use crate::command::requests::{EndpointForm, EndpointSelector};
use crate::command::{Command, CommandEnvelope, CommandResult, validate_port};
use crate::config::{ConsoleConfig, TlsVerification};
use crate::convert::{directory_from_wire, telemetry_from_wire};
use crate::error::CoreError;
use crate::model::{DirectorySnapshot, Position, TelemetrySnapshot};
use crate::reconcile::DisplayModel;
use crate::store::SnapshotStore;
use crate::stream::DisplayStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Connected, but the last fetch could not reach the host.
    Unavailable,
}

/// Current values of one endpoint, for populating an edit dialog.
#[derive(Debug, Clone)]
pub struct EditDraft {
    /// Position in the freshly fetched directory.
    pub position: Position,
    pub form: EndpointForm,
    pub enabled: bool,
}

// ── Console ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Manages the session
/// lifecycle: client setup, background polling, command routing, and
/// the reactive display stream.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    store: Arc<SnapshotStore>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current session, cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    client: ArcSwapOption<HostClient>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Console {
    /// Create a new Console from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to fetch and start background tasks.
    pub fn new(config: ConsoleConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ConsoleInner {
                config,
                store: Arc::new(SnapshotStore::new()),
                connection_state,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: ArcSwapOption::empty(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the console configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Access the underlying SnapshotStore.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the host.
    ///
    /// Builds the HTTP client, fetches the directory and telemetry once,
    /// then spawns the command processor and the poll tasks. Fails if the
    /// client cannot be built or the initial directory fetch fails; a
    /// failed initial telemetry fetch is only recorded.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let client = match HostClient::new(config.url.clone(), &build_transport(config)) {
            Ok(client) => client,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(e.into());
            }
        };
        self.inner.client.store(Some(Arc::new(client)));

        let (directory, telemetry) = tokio::join!(self.fetch_directory(), self.fetch_telemetry());
        if let Err(e) = directory {
            self.inner.client.store(None);
            self.set_state(if e.is_unavailable() {
                ConnectionState::Unavailable
            } else {
                ConnectionState::Disconnected
            });
            return Err(e);
        }
        if let Err(e) = telemetry {
            warn!(error = %e, "initial telemetry fetch failed");
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let console = self.clone();
            handles.push(tokio::spawn(command_processor_task(console, rx, child.clone())));
        }

        let telemetry_interval = config.telemetry_interval;
        if !telemetry_interval.is_zero() {
            let console = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(telemetry_poll_task(console, telemetry_interval, cancel)));
        }

        let directory_interval = config.directory_interval;
        if !directory_interval.is_zero() {
            let console = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(directory_refresh_task(
                console,
                directory_interval,
                cancel,
            )));
        }

        self.set_state(ConnectionState::Connected);
        info!(url = %config.url, "connected to host");
        Ok(())
    }

    /// Disconnect from the host.
    ///
    /// Cancels background tasks, drops the client and discards both
    /// snapshots.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent, so reconnect works).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.client.store(None);
        self.inner.store.clear();

        // Recreate command channel so reconnects can spawn a fresh receiver.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Fetchers ─────────────────────────────────────────────────

    /// Fetch the directory and replace the stored snapshot.
    ///
    /// On failure the previous snapshot is kept and the failure is
    /// recorded on the display model.
    pub async fn fetch_directory(&self) -> Result<Arc<DirectorySnapshot>, CoreError> {
        let result = async {
            let client = self.require_client()?;
            directory_from_wire(client.get_config().await?)
        }
        .await;

        match result {
            Ok(snapshot) => {
                let stored = self.inner.store.apply_directory(snapshot);
                self.mark_reachable();
                debug!(
                    endpoints = stored.len(),
                    version = stored.version,
                    "directory refreshed"
                );
                Ok(stored)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Fetch usage counters and replace the stored snapshot.
    pub async fn fetch_telemetry(&self) -> Result<Arc<TelemetrySnapshot>, CoreError> {
        let result = async {
            let client = self.require_client()?;
            Ok::<_, CoreError>(telemetry_from_wire(client.get_stats().await?))
        }
        .await;

        match result {
            Ok(snapshot) => {
                let stored = self.inner.store.apply_telemetry(snapshot);
                self.mark_reachable();
                debug!(total_requests = stored.total_requests, "telemetry refreshed");
                Ok(stored)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    fn record_failure(&self, err: CoreError) -> CoreError {
        self.inner.store.record_failure(&err);
        if err.is_unavailable() && self.connection_state_now() == ConnectionState::Connected {
            self.set_state(ConnectionState::Unavailable);
        }
        err
    }

    fn mark_reachable(&self) {
        if self.connection_state_now() == ConnectionState::Unavailable {
            self.set_state(ConnectionState::Connected);
        }
    }

    // ── Position helpers ─────────────────────────────────────────

    /// Resolve an index or endpoint name against the current directory,
    /// fetching one first if none is held yet.
    pub async fn resolve(&self, selector: &EndpointSelector) -> Result<Position, CoreError> {
        let directory = match self.inner.store.directory() {
            Some(d) => d,
            None => self.fetch_directory().await?,
        };

        match selector {
            EndpointSelector::Index(index) => {
                directory
                    .position(*index)
                    .ok_or(CoreError::PositionOutOfRange {
                        index: *index,
                        len: directory.len(),
                    })
            }
            EndpointSelector::Name(name) => match directory.positions_named(name).as_slice() {
                [only] => Ok(*only),
                [] => Err(CoreError::validation(
                    "endpoint",
                    format!("no endpoint named '{name}'"),
                )),
                many => Err(CoreError::validation(
                    "endpoint",
                    format!(
                        "{} endpoints are named '{name}'; use an index instead",
                        many.len()
                    ),
                )),
            },
        }
    }

    /// Re-fetch the directory and return the current values at `position`
    /// for an edit dialog.
    ///
    /// The returned draft carries a position from the fresh snapshot, so an
    /// edit submitted from it is checked against that layout.
    pub async fn edit_form(&self, position: Position) -> Result<EditDraft, CoreError> {
        self.fetch_directory().await?;
        let strict = self.inner.config.strict_positions;
        let endpoint = self.inner.store.check_position(position, strict)?;
        let fresh = self
            .inner
            .store
            .directory()
            .and_then(|d| d.position(position.index()))
            .unwrap_or(position);

        Ok(EditDraft {
            position: fresh,
            form: EndpointForm {
                name: endpoint.name,
                api_url: endpoint.api_url,
                api_key: endpoint.api_key,
            },
            enabled: endpoint.enabled,
        })
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the host.
    ///
    /// Validates locally, then sends the command through the internal
    /// channel to the command processor and awaits the result. A command
    /// that fails validation never reaches the host.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let cmd = cmd.validate()?;

        if !matches!(
            self.connection_state_now(),
            ConnectionState::Connected | ConnectionState::Unavailable
        ) {
            return Err(CoreError::NotConnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    /// Add an endpoint. See [`Command::AddEndpoint`].
    pub async fn add_endpoint(&self, form: EndpointForm) -> Result<CommandResult, CoreError> {
        self.execute(Command::AddEndpoint(form)).await
    }

    pub async fn update_endpoint(
        &self,
        position: Position,
        form: EndpointForm,
    ) -> Result<CommandResult, CoreError> {
        self.execute(Command::UpdateEndpoint { position, form }).await
    }

    pub async fn remove_endpoint(&self, position: Position) -> Result<CommandResult, CoreError> {
        self.execute(Command::RemoveEndpoint { position }).await
    }

    pub async fn toggle_endpoint(
        &self,
        position: Position,
        enabled: bool,
    ) -> Result<CommandResult, CoreError> {
        self.execute(Command::ToggleEndpoint { position, enabled })
            .await
    }

    /// Change the listen port. Takes effect after the host restarts.
    pub async fn update_port(&self, port: u32) -> Result<CommandResult, CoreError> {
        self.execute(Command::UpdatePort { port }).await
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Optimized for CLI: disables the poll tasks since we only need a
    /// single request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: ConsoleConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Console) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.telemetry_interval = Duration::ZERO;
        cfg.directory_interval = Duration::ZERO;

        let console = Console::new(cfg);
        console.connect().await?;
        let result = f(console.clone()).await;
        console.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    fn connection_state_now(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.connection_state.send_replace(state);
    }

    /// Current display model.
    pub fn display(&self) -> Arc<DisplayModel> {
        self.inner.store.display()
    }

    /// Subscribe to display model rebuilds.
    pub fn subscribe(&self) -> DisplayStream {
        self.inner.store.subscribe()
    }

    pub fn directory_snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        self.inner.store.directory()
    }

    fn require_client(&self) -> Result<Arc<HostClient>, CoreError> {
        self.inner
            .client
            .load_full()
            .ok_or_else(|| CoreError::BackendUnavailable {
                url: self.inner.config.url.to_string(),
                reason: "host integration not available".into(),
            })
    }

    /// Refresh the directory after the host accepted a mutation. A failed
    /// refresh is recorded but does not turn the mutation into a failure.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.fetch_directory().await {
            warn!(error = %e, "directory refresh after mutation failed");
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Poll usage counters on a fixed cadence. Failures are logged and the
/// loop keeps its schedule.
async fn telemetry_poll_task(console: Console, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = console.fetch_telemetry().await {
                    warn!(error = %e, "telemetry poll failed");
                }
            }
        }
    }
}

/// Re-read the endpoint list on its own cadence, independently of the
/// telemetry poll.
async fn directory_refresh_task(console: Console, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = console.fetch_directory().await {
                    warn!(error = %e, "directory refresh failed");
                }
            }
        }
    }
}

/// Receive commands from the mpsc channel. Each command runs in its own
/// task, so a slow host call never holds up the next command.
async fn command_processor_task(
    console: Console,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let console = console.clone();
                tokio::spawn(async move {
                    let result = route_command(&console, envelope.command).await;
                    let _ = envelope.response_tx.send(result);
                });
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

/// Route a validated command to the host.
///
/// Positions are checked against the current directory before the call.
/// Only the toggle changes visible state ahead of the host's answer.
async fn route_command(console: &Console, cmd: Command) -> Result<CommandResult, CoreError> {
    let client = console.require_client()?;
    let store = &console.inner.store;
    let strict = console.inner.config.strict_positions;
    let reshapes = cmd.reshapes_directory();

    let result = match cmd {
        Command::AddEndpoint(form) => {
            client.add_endpoint(&form.payload()).await?;
            info!(name = %form.name, "endpoint added");
            CommandResult::Ok
        }

        Command::UpdateEndpoint { position, form } => {
            store.check_position(position, strict)?;
            client
                .update_endpoint(position.index(), &form.payload())
                .await?;
            info!(%position, name = %form.name, "endpoint updated");
            CommandResult::Ok
        }

        Command::RemoveEndpoint { position } => {
            let endpoint = store.check_position(position, strict)?;
            client.remove_endpoint(position.index()).await?;
            info!(%position, name = %endpoint.name, "endpoint removed");
            CommandResult::Ok
        }

        Command::ToggleEndpoint { position, enabled } => {
            return route_toggle(console, &client, position, enabled).await;
        }

        Command::UpdatePort { port } => {
            let port = validate_port(port)?;
            client.update_port(port).await?;
            info!(port, "listen port updated; host restart required");
            CommandResult::PortUpdated {
                port,
                restart_required: true,
            }
        }
    };

    if reshapes {
        store.invalidate_positions();
    }
    console.refresh_after_mutation().await;
    Ok(result)
}

/// Idle → Pending → Committed | RolledBack.
async fn route_toggle(
    console: &Console,
    client: &HostClient,
    position: Position,
    enabled: bool,
) -> Result<CommandResult, CoreError> {
    let store = &console.inner.store;
    let index = position.index();

    if store
        .begin_toggle(position, enabled, console.inner.config.strict_positions)?
        .is_none()
    {
        return Ok(CommandResult::Toggled {
            index,
            enabled,
            changed: false,
        });
    }

    match client.toggle_endpoint(index, enabled).await {
        Ok(()) => {
            store.commit_toggle(position);
            info!(%position, enabled, "endpoint toggled");
            console.refresh_after_mutation().await;
            Ok(CommandResult::Toggled {
                index,
                enabled,
                changed: true,
            })
        }
        Err(e) => {
            store.roll_back_toggle(position);
            warn!(%position, enabled, error = %e, "toggle rejected, rolled back");
            Err(e.into())
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the console configuration.
fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        token: config.token.clone(),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
