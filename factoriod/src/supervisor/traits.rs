//! Seams between the supervisor and its collaborators.
//!
//! The run loop talks to the version APIs and the acquirer through these
//! traits so resolution logic can be exercised against stubs — the tests
//! care about which calls happen (a reuse must make none), not about HTTP.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::acquire::{AcquireResult, ReleaseAcquirer};
use crate::catalog::{CatalogResult, UpdateStep, VersionCatalog};
use crate::version::{Distro, FactorioVersion, InstalledRelease, Release, ReleaseBuild};

/// Published-version queries the supervisor needs.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// The most recent published headless release.
    async fn latest_headless(&self, include_experimental: bool) -> CatalogResult<Release>;

    /// The release installed in `dir`, if its metadata is readable.
    async fn installed_release(&self, dir: &Path) -> Option<InstalledRelease>;

    /// The patch chain from `from` to exactly `to`, or `None` if the
    /// published graph holds no path.
    async fn update_path(
        &self,
        from: FactorioVersion,
        to: FactorioVersion,
    ) -> CatalogResult<Option<Vec<UpdateStep>>>;
}

#[async_trait]
impl VersionSource for VersionCatalog {
    async fn latest_headless(&self, include_experimental: bool) -> CatalogResult<Release> {
        VersionCatalog::latest_headless(self, include_experimental).await
    }

    async fn installed_release(&self, dir: &Path) -> Option<InstalledRelease> {
        VersionCatalog::installed_release(self, dir).await
    }

    async fn update_path(
        &self,
        from: FactorioVersion,
        to: FactorioVersion,
    ) -> CatalogResult<Option<Vec<UpdateStep>>> {
        VersionCatalog::update_path(self, from, to).await
    }
}

/// Install materialization the supervisor needs.
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// Download and extract a full release, returning the install directory.
    async fn download_release(
        &self,
        version: FactorioVersion,
        build: ReleaseBuild,
        distro: Distro,
        output_dir: &Path,
    ) -> AcquireResult<PathBuf>;

    /// Apply a patch chain to an existing install.
    async fn update_install(
        &self,
        executable: &Path,
        install_dir: &Path,
        steps: &[UpdateStep],
        updates_dir: &Path,
    ) -> AcquireResult<()>;
}

#[async_trait]
impl ReleaseProvider for ReleaseAcquirer {
    async fn download_release(
        &self,
        version: FactorioVersion,
        build: ReleaseBuild,
        distro: Distro,
        output_dir: &Path,
    ) -> AcquireResult<PathBuf> {
        ReleaseAcquirer::download_release(self, version, build, distro, output_dir).await
    }

    async fn update_install(
        &self,
        executable: &Path,
        install_dir: &Path,
        steps: &[UpdateStep],
        updates_dir: &Path,
    ) -> AcquireResult<()> {
        ReleaseAcquirer::update_install(self, executable, install_dir, steps, updates_dir).await
    }
}
