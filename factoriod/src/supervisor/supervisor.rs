//! The run loop and its public operations.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::FactorioConfig;
use crate::saves::{Save, SaveManager};
use crate::settings::MapGenSettings;

use super::error::{SupervisorError, SupervisorResult};
use super::events::{classify_line, OutputEvent};
use super::launch::{build_server_plan, MapCreator};
use super::process::{wait_with_escalation, DEFAULT_SIGNAL_GRACE};
use super::resolve::{resolve_install_dir, resolve_requested_version};
use super::scope::CancellationScope;
use super::status::{ServerFault, ServerStatus, StatusHolder};
use super::traits::{ReleaseProvider, VersionSource};

/// Result of asking the active run to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no active run.
    NotRunning,
    /// The run finished within the deadline; carries its final code.
    Stopped(i32),
    /// The deadline elapsed first. The process may still be alive — the
    /// run stays owned and a later stop or start call will find it.
    DeadlineElapsed,
}

/// Supervises the one game-server run of this daemon.
///
/// At most one run task exists at a time, owned through an explicit handle
/// slot: `start` is a no-op while a run is live, and the compound
/// operations (`restart`, `set_save`, `create_save`) serialize behind one
/// async mutex so they can never race each other into two concurrent runs.
pub struct ServerSupervisor {
    inner: Arc<Inner>,
    slot: Mutex<Option<RunHandle>>,
    ops: tokio::sync::Mutex<()>,
}

struct Inner {
    config: FactorioConfig,
    source: Arc<dyn VersionSource>,
    provider: Arc<dyn ReleaseProvider>,
    saves: SaveManager,
    status: Arc<StatusHolder>,
    /// Daemon-level shutdown; composes with every run.
    shutdown: CancellationToken,
    /// Restart trigger for the current attempt, swapped fresh per iteration.
    restart: Mutex<CancellationToken>,
    /// Final code of the last completed run, `None` while one is active.
    exit: watch::Sender<Option<i32>>,
    signal_grace: Duration,
}

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<i32>,
}

impl ServerSupervisor {
    pub fn new(
        config: FactorioConfig,
        source: Arc<dyn VersionSource>,
        provider: Arc<dyn ReleaseProvider>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::with_signal_grace(config, source, provider, shutdown, DEFAULT_SIGNAL_GRACE)
    }

    /// Construct with a custom escalation grace window. Tests use a short
    /// window to keep the three-stage shutdown fast.
    pub fn with_signal_grace(
        config: FactorioConfig,
        source: Arc<dyn VersionSource>,
        provider: Arc<dyn ReleaseProvider>,
        shutdown: CancellationToken,
        signal_grace: Duration,
    ) -> Self {
        let saves = SaveManager::new(&config.saves.root_directory);
        let (exit, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                config,
                source,
                provider,
                saves,
                status: StatusHolder::new(),
                shutdown,
                restart: Mutex::new(CancellationToken::new()),
                exit,
                signal_grace,
            }),
            slot: Mutex::new(None),
            ops: tokio::sync::Mutex::new(()),
        }
    }

    /// The save manager this supervisor operates on.
    pub fn saves(&self) -> &SaveManager {
        &self.inner.saves
    }

    /// Snapshot of the current server status.
    pub fn status(&self) -> ServerStatus {
        self.inner.status.snapshot()
    }

    /// Launch the run loop. Returns `false` (and does nothing) when a run
    /// is already active.
    pub async fn start(&self) -> bool {
        let _ops = self.ops.lock().await;
        self.start_locked()
    }

    /// Cancel the active run and wait up to `deadline` for it to finish.
    pub async fn stop(&self, deadline: Duration) -> StopOutcome {
        let _ops = self.ops.lock().await;
        self.stop_locked(deadline).await
    }

    /// Stop the active run, then start a fresh one.
    pub async fn restart(&self, deadline: Duration) -> StopOutcome {
        let _ops = self.ops.lock().await;
        let outcome = self.stop_locked(deadline).await;
        // When the deadline elapsed the old run still owns the slot and
        // this start is a no-op; the caller sees DeadlineElapsed.
        self.start_locked();
        outcome
    }

    /// Repoint the current save and restart into it.
    ///
    /// Fails `NotFound` when the save file does not exist. An active run is
    /// recycled through its restart trigger; an idle supervisor simply
    /// starts.
    pub async fn set_save(&self, save: &Save) -> SupervisorResult<()> {
        let _ops = self.ops.lock().await;
        self.inner.saves.set_current_save(save)?;

        if self.run_active() {
            info!(save = %save.name(), "restarting into newly selected save");
            self.inner.restart.lock().cancel();
        } else {
            self.start_locked();
        }
        Ok(())
    }

    /// Stop the server, create a save through the binary, and start into it.
    pub async fn create_save(
        &self,
        name: &str,
        map_gen: Option<MapGenSettings>,
        overwrite: bool,
        deadline: Duration,
    ) -> SupervisorResult<Save> {
        let _ops = self.ops.lock().await;

        if self.stop_locked(deadline).await == StopOutcome::DeadlineElapsed {
            return Err(SupervisorError::StopTimedOut);
        }

        let install_dir = self.inner.config.executable.install_dir();
        let creator =
            MapCreator::new(self.inner.config.clone()).with_map_gen_settings(map_gen);
        let created = self
            .inner
            .saves
            .create_save(&install_dir, name, overwrite, &creator)
            .await;

        // Start again either way: on failure the previous selection is
        // untouched and the server resumes with it.
        self.start_locked();
        Ok(created?)
    }

    /// Wait until the current run finishes and return its final code.
    pub async fn wait(&self) -> i32 {
        let mut rx = self.inner.exit.subscribe();
        loop {
            if let Some(code) = *rx.borrow_and_update() {
                return code;
            }
            if rx.changed().await.is_err() {
                return 0;
            }
        }
    }

    fn run_active(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .map(|handle| !handle.task.is_finished())
            .unwrap_or(false)
    }

    fn start_locked(&self) -> bool {
        let mut slot = self.slot.lock();
        if let Some(handle) = slot.as_ref() {
            if !handle.task.is_finished() {
                debug!("start requested but a run is already active");
                return false;
            }
        }

        let inner = Arc::clone(&self.inner);
        inner.exit.send_replace(None);
        let cancel = inner.shutdown.child_token();
        let run_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let code = run_loop(&inner, run_cancel).await;
            inner.exit.send_replace(Some(code));
            code
        });

        *slot = Some(RunHandle { cancel, task });
        true
    }

    async fn stop_locked(&self, deadline: Duration) -> StopOutcome {
        let handle = self.slot.lock().take();
        let Some(mut handle) = handle else {
            return StopOutcome::NotRunning;
        };

        if handle.task.is_finished() {
            let code = handle.task.await.unwrap_or(2);
            return StopOutcome::Stopped(code);
        }

        info!("stopping the active run");
        handle.cancel.cancel();

        match timeout(deadline, &mut handle.task).await {
            Ok(Ok(code)) => StopOutcome::Stopped(code),
            Ok(Err(e)) => {
                error!(error = %e, "run task failed");
                StopOutcome::Stopped(2)
            }
            Err(_) => {
                warn!("run did not stop within the deadline");
                *self.slot.lock() = Some(handle);
                StopOutcome::DeadlineElapsed
            }
        }
    }
}

/// Outcome of a single attempt (one process lifetime).
enum AttemptOutcome {
    Exited(Option<i32>),
    Faulted,
}

async fn run_loop(inner: &Arc<Inner>, shutdown: CancellationToken) -> i32 {
    loop {
        let restart_token = CancellationToken::new();
        *inner.restart.lock() = restart_token.clone();

        let scope = CancellationScope::new(shutdown.clone(), restart_token.clone());
        let attempt = run_attempt(inner, scope.token()).await;
        drop(scope);

        let stop_requested = shutdown.is_cancelled() || restart_token.is_cancelled();
        let code = match attempt {
            Err(e) => {
                error!(error = %e, "run attempt aborted");
                inner.status.set_exited();
                return 2;
            }
            Ok(AttemptOutcome::Faulted) => return 2,
            Ok(AttemptOutcome::Exited(code)) => match code {
                Some(0) => 0,
                // the binary exits with 1 when stopped by its host; that
                // only counts as success when this daemon asked for it
                Some(1) if stop_requested => 0,
                Some(other) => other,
                // killed by signal: ours (escalation) or someone else's
                None if stop_requested => 0,
                None => 2,
            },
        };

        if shutdown.is_cancelled() {
            return code;
        }
        if restart_token.is_cancelled() && code == 0 {
            info!("restart requested, starting a new attempt");
            continue;
        }
        return code;
    }
}

async fn run_attempt(
    inner: &Arc<Inner>,
    cancel: &CancellationToken,
) -> SupervisorResult<AttemptOutcome> {
    inner.status.set_launching();

    let requested = resolve_requested_version(inner.source.as_ref(), &inner.config.executable).await?;
    let install_dir = resolve_install_dir(
        inner.source.as_ref(),
        inner.provider.as_ref(),
        &inner.config.executable,
        requested,
    )
    .await?;

    if cancel.is_cancelled() {
        debug!("cancelled before launch");
        return Ok(AttemptOutcome::Exited(Some(0)));
    }

    let creator = MapCreator::new(inner.config.clone());
    let save = inner.saves.select_or_create(&install_dir, &creator).await?;
    inner.status.set_save(save.clone());

    let plan = build_server_plan(&inner.config, &install_dir, &save)?;
    inner.saves.backup_best_effort(&save);

    info!(save = %save.name(), program = %plan.program.display(), "starting server process");
    let mut child = plan
        .command()
        .spawn()
        .map_err(|source| SupervisorError::Spawn {
            program: plan.program.clone(),
            source,
        })?;

    let fault: Arc<Mutex<Option<ServerFault>>> = Arc::new(Mutex::new(None));
    let stdout_task = child.stdout.take().map(|stdout| {
        tokio::spawn(read_stdout(
            stdout,
            Arc::clone(&inner.status),
            save.clone(),
            Arc::clone(&fault),
        ))
    });
    let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(read_stderr(stderr)));

    let exit_status = wait_with_escalation(&mut child, cancel, inner.signal_grace).await?;

    // Drain the readers to completion before interpreting the exit: a
    // fault diagnostic printed just before death must win over the code.
    if let Some(task) = stdout_task {
        task.await.ok();
    }
    if let Some(task) = stderr_task {
        task.await.ok();
    }

    if let Some(fault) = fault.lock().take() {
        warn!(%fault, "run ended in a fault");
        inner.status.set_faulted(fault);
        return Ok(AttemptOutcome::Faulted);
    }

    inner.status.set_exited();
    info!(code = ?exit_status.code(), "server process exited");
    Ok(AttemptOutcome::Exited(exit_status.code()))
}

async fn read_stdout(
    stdout: ChildStdout,
    status: Arc<StatusHolder>,
    save: Save,
    fault: Arc<Mutex<Option<ServerFault>>>,
) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        trace!(%line, "server output");
        match classify_line(&line) {
            Some(OutputEvent::IncompatibleMapVersion {
                game_version,
                map_version,
            }) => {
                warn!(%map_version, %game_version, "save is newer than the installed binary");
                *fault.lock() = Some(ServerFault::IncompatibleMapVersion {
                    game_version,
                    map_version,
                    save: Some(save.clone()),
                });
            }
            Some(OutputEvent::GameReady) => {
                info!("server is ready for players");
                status.set_running(save.clone());
            }
            Some(OutputEvent::PlayerJoined(user)) => info!(%user, "player joined"),
            Some(OutputEvent::PlayerLeft(user)) => info!(%user, "player left"),
            None => {}
        }
    }
}

async fn read_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(%line, "server error output");
    }
}
