//! Server process supervision.
//!
//! The supervisor owns the single run loop of the daemon: it materializes
//! the requested install (reuse, patch, or fresh download), resolves the
//! save to run, launches the binary, classifies its output stream, and owns
//! the graceful-to-forceful shutdown path. External callers interact with a
//! small serialized surface — start, stop, restart, set-save, create-save —
//! and read state through [`ServerStatus`] snapshots.

mod error;
mod events;
mod launch;
mod process;
mod resolve;
mod scope;
mod status;
mod supervisor;
mod traits;

pub use error::{SupervisorError, SupervisorResult};
pub use events::{classify_line, OutputEvent};
pub use launch::MapCreator;
pub use status::{ServerFault, ServerState, ServerStatus, StatusHolder};
pub use supervisor::{ServerSupervisor, StopOutcome};
pub use traits::{ReleaseProvider, VersionSource};
