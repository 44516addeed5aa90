//! Per-attempt cancellation scope.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A cancellation token derived from two parents, disposed deterministically.
///
/// Each run attempt observes both the daemon shutdown token and the
/// attempt's restart token. The scope forwards whichever fires first into a
/// single child token and tears its watcher down on drop, so nothing stays
/// wired to the long-lived shutdown token across restarts.
pub(crate) struct CancellationScope {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl CancellationScope {
    pub fn new(first: CancellationToken, second: CancellationToken) -> Self {
        let token = CancellationToken::new();
        let child = token.clone();
        let watcher = tokio::spawn(async move {
            tokio::select! {
                _ = first.cancelled() => {}
                _ = second.cancelled() => {}
            }
            child.cancel();
        });

        Self { token, watcher }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for CancellationScope {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
