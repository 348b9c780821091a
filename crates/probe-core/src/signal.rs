//! Interrupt handling for continuous mode.
//!
//! The first SIGINT (or SIGTERM on unix) cancels the token the engine checks
//! between rounds. A second one exits the process at once, for when an
//! in-flight request keeps the run from reaching a round boundary.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exit status after a forced interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Spawn a task that cancels `token` on the first interrupt and exits the
/// process on the second.
///
/// The task exits without cancelling if the token is cancelled elsewhere
/// before any interrupt arrives. Abort the handle once the run is over.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(listen(token, wait_for_signal, || {
        warn!(target: "probe::signal", "Second interrupt received, exiting");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }))
}

async fn listen<S, F>(token: CancellationToken, mut next_signal: S, force_exit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = next_signal() => {
            info!(target: "probe::signal", "Interrupt received, stopping after the current round");
            token.cancel();
        }
        _ = token.cancelled() => {
            debug!(target: "probe::signal", "Signal listener stopped");
            return;
        }
    }

    next_signal().await;
    force_exit();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(target: "probe::signal", "Failed to install SIGTERM handler: {}", e);
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(target: "probe::signal", "Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
