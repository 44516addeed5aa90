//! The daemon run loop: supervise the server until a signal or a failure.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use factoriod::acquire::ReleaseAcquirer;
use factoriod::catalog::VersionCatalog;
use factoriod::config::FactorioConfig;
use factoriod::supervisor::{ServerSupervisor, StopOutcome};

/// How long a signal-initiated shutdown waits for the run to wind down.
/// Generous because the game saves on exit.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(60);

pub async fn execute(config: FactorioConfig) -> ExitCode {
    info!(version = %config.executable.version, "factoriod starting");

    let shutdown = CancellationToken::new();
    let client = reqwest::Client::new();
    let supervisor = ServerSupervisor::new(
        config,
        Arc::new(VersionCatalog::new(client.clone())),
        Arc::new(ReleaseAcquirer::new(client)),
        shutdown.clone(),
    );

    supervisor.start().await;

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received, stopping the server");
            shutdown.cancel();
            match supervisor.stop(SHUTDOWN_DEADLINE).await {
                StopOutcome::Stopped(0) | StopOutcome::NotRunning => ExitCode::SUCCESS,
                StopOutcome::Stopped(code) => {
                    warn!(code, "server exited abnormally during shutdown");
                    ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
                }
                StopOutcome::DeadlineElapsed => {
                    error!("server did not stop within the shutdown deadline");
                    ExitCode::from(2)
                }
            }
        }
        code = supervisor.wait() => {
            // the run ended on its own; a nonzero code brings the daemon down
            if code == 0 {
                info!("server run completed");
                ExitCode::SUCCESS
            } else {
                error!(code, "server run failed, shutting the daemon down");
                ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
            }
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "could not install SIGTERM handler, handling SIGINT only");
            let _ = ctrl_c.await;
        }
    }
}
