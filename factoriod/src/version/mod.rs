//! Factorio version and release identity types.
//!
//! These types are shared across all contexts:
//! - **Catalog**: listing published releases and the update graph
//! - **Acquirer**: building download URLs
//! - **Supervisor**: deciding whether an install can be reused, patched,
//!   or must be replaced

mod core;
mod release;
mod types;

pub use core::{FactorioVersion, ParseVersionError};
pub use release::{InstalledRelease, Release};
pub use types::{Distro, ReleaseBuild};
