//! Data bridge: connects the [`Console`] to TUI actions.
//!
//! Runs as a background task: keeps trying to connect until the host
//! answers, and meanwhile forwards every display model rebuild and
//! connection-state transition as an [`Action`].

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ccnexus_core::Console;

use crate::action::Action;

/// Delay between connect attempts while the host is unreachable.
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Forward `console` state into the action channel until cancelled, then
/// disconnect.
pub async fn spawn_data_bridge(
    console: Console,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // The stream yields the model the store holds right now first, so
    // screens never wait for the next rebuild to draw.
    let mut display = console.subscribe().into_stream();
    let mut conn_state = console.connection_state();

    let _ = action_tx.send(Action::ConnectionChanged(*conn_state.borrow_and_update()));

    let connector = tokio::spawn(connect_with_retry(
        console.clone(),
        action_tx.clone(),
        cancel.clone(),
    ));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(model) = display.next() => {
                debug!(version = model.version, "dispatching DisplayUpdated");
                let _ = action_tx.send(Action::DisplayUpdated(model));
            }
            Ok(()) = conn_state.changed() => {
                let state = *conn_state.borrow_and_update();
                let _ = action_tx.send(Action::ConnectionChanged(state));
            }
        }
    }

    connector.abort();
    console.disconnect().await;
    debug!("data bridge shut down");
}

async fn connect_with_retry(
    console: Console,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    loop {
        match console.connect().await {
            Ok(()) => {
                info!("console connected");
                return;
            }
            Err(e) => {
                warn!(error = %e, "connect failed, retrying in {}s", RETRY_INTERVAL.as_secs());
                let _ = action_tx.send(Action::ConnectFailed(e.to_string()));
            }
        }

        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(RETRY_INTERVAL) => {}
        }
    }
}
