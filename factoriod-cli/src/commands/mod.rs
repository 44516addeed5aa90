//! Subcommand implementations.

pub mod console;
pub mod run;
pub mod saves;
