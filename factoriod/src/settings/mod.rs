//! Game settings files: server settings, map generation, map behavior.
//!
//! Factorio consumes these as JSON files passed on the command line. The
//! models here exist to give the daemon default-filled objects to generate
//! when the operator has not written their own:
//! - top-level keys are snake_case
//! - the autoplace-control dictionary is keyed by kebab-case item names
//!   (`"iron-ore"`, `"copper-ore"`, ...)
//!
//! [`read_or_default`] is the single place where a missing settings file
//! becomes a default object; everywhere else absence is an error.

mod io;
mod map_gen;
mod server;

pub use io::{ensure_empty_list, read_or_default, write_pretty, SettingsError, SettingsResult};
pub use map_gen::{CliffSettings, FrequencySizeRichness, MapGenSettings, MapSettings};
pub use server::{ServerSettings, Visibility};
