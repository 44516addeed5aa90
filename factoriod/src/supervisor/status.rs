//! Shared server status.
//!
//! One [`StatusHolder`] exists per daemon. Only the run loop writes to it
//! (the setters are crate-private); everyone else takes point-in-time
//! snapshots and tolerates eventual consistency.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::saves::Save;
use crate::version::FactorioVersion;

/// Lifecycle state of the game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    /// Resolving the install and save, or waiting for the game to come up.
    #[default]
    Launching,
    /// The game reported itself ready for players.
    Running,
    /// The process has exited.
    Exited,
    /// The run ended in a recognized fault.
    Faulted,
}

/// A typed fault captured from the server's output, distinct from a plain
/// nonzero exit.
#[derive(Debug, Clone)]
pub enum ServerFault {
    /// The save was produced by a newer game version than the installed
    /// binary and cannot be loaded.
    IncompatibleMapVersion {
        game_version: FactorioVersion,
        map_version: FactorioVersion,
        save: Option<Save>,
    },
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleMapVersion {
                game_version,
                map_version,
                save,
            } => {
                write!(
                    f,
                    "map version {} cannot be loaded by game version {}",
                    map_version, game_version
                )?;
                if let Some(save) = save {
                    write!(f, " (save {})", save.name())?;
                }
                Ok(())
            }
        }
    }
}

/// Point-in-time view of the server.
#[derive(Debug, Clone, Default)]
pub struct ServerStatus {
    pub state: ServerState,
    /// Fault detail when `state` is [`ServerState::Faulted`].
    pub fault: Option<ServerFault>,
    /// The save the current (or last) run is playing.
    pub save: Option<Save>,
}

/// Single-writer status cell.
#[derive(Debug, Default)]
pub struct StatusHolder {
    inner: RwLock<ServerStatus>,
}

impl StatusHolder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A snapshot of the current status.
    pub fn snapshot(&self) -> ServerStatus {
        self.inner.read().clone()
    }

    /// A fresh attempt begins: clear any fault from a prior run.
    pub(crate) fn set_launching(&self) {
        let mut status = self.inner.write();
        status.state = ServerState::Launching;
        status.fault = None;
    }

    pub(crate) fn set_running(&self, save: Save) {
        let mut status = self.inner.write();
        status.state = ServerState::Running;
        status.save = Some(save);
    }

    /// Record the process exit. A fault that was already captured wins —
    /// the state never regresses from Faulted within a run.
    pub(crate) fn set_exited(&self) {
        let mut status = self.inner.write();
        if status.state != ServerState::Faulted {
            status.state = ServerState::Exited;
        }
    }

    pub(crate) fn set_faulted(&self, fault: ServerFault) {
        let mut status = self.inner.write();
        status.state = ServerState::Faulted;
        status.fault = Some(fault);
    }

    /// The save the run loop resolved for the current attempt.
    pub(crate) fn set_save(&self, save: Save) {
        self.inner.write().save = Some(save);
    }
}
