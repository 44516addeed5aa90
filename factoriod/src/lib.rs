//! factoriod - a daemon that operates a Factorio headless server.
//!
//! The library acquires the requested game version (full downloads and
//! incremental patches), selects or creates the save to run, supervises the
//! server process through a controlled lifecycle with signal escalation,
//! and speaks the remote-console protocol to the live server. The thin
//! daemon binary in `factoriod-cli` wires these pieces to configuration and
//! signals.

pub mod acquire;
pub mod catalog;
pub mod config;
pub mod rcon;
pub mod saves;
pub mod settings;
pub mod supervisor;
pub mod version;
