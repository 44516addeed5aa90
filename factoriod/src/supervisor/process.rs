//! Child process waiting with staged signal escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Grace window between escalation stages.
pub(crate) const DEFAULT_SIGNAL_GRACE: Duration = Duration::from_secs(5);

/// Wait for `child` to exit, or shut it down when `cancel` fires.
///
/// A single signal is not reliably honored by the game (saves in progress
/// defer handling, wedged processes never handle it), so cancellation walks
/// three stages: SIGINT, then after `grace` SIGTERM, then after another
/// `grace` an unconditional SIGKILL. The function only returns once the
/// process has actually exited.
pub(crate) async fn wait_with_escalation(
    child: &mut Child,
    cancel: &CancellationToken,
    grace: Duration,
) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => return status,
        _ = cancel.cancelled() => {}
    }

    info!("stop requested, interrupting the server process");
    send_signal(child, libc::SIGINT);
    if let Ok(status) = timeout(grace, child.wait()).await {
        return status;
    }

    warn!("server ignored the interrupt, terminating");
    send_signal(child, libc::SIGTERM);
    if let Ok(status) = timeout(grace, child.wait()).await {
        return status;
    }

    warn!("server ignored the termination request, killing");
    child.start_kill()?;
    child.wait().await
}

/// Deliver `signal` to the child if it is still running.
fn send_signal(child: &Child, signal: libc::c_int) {
    if let Some(pid) = child.id() {
        // SAFETY: kill with a valid pid and signal has no memory effects.
        unsafe {
            libc::kill(pid as libc::pid_t, signal);
        }
    }
}
