//! Version catalog: published releases and the incremental-update graph.
//!
//! Everything here is backed by one network call per invocation; nothing is
//! cached. A network or parse failure is reported as an error for the caller
//! to treat as absence — resolution logic elsewhere decides whether to fall
//! back, the catalog never does.

mod error;
mod fetcher;
mod updates;

pub use error::{CatalogError, CatalogResult};
pub use fetcher::VersionCatalog;
pub use updates::{UpdateGraph, UpdateStep};
