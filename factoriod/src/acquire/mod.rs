//! Release acquisition: full archives and incremental patches.
//!
//! The acquirer materializes installs on disk. Full releases are streamed to
//! a staging archive, extracted through the system `tar`, and only renamed
//! to the canonical directory once extraction succeeded — a failed download
//! or extraction never leaves a half-populated install under the canonical
//! name. Incremental patches are downloaded in parallel but applied
//! strictly in chain order through the installed binary's self-update mode.

mod download;
mod error;
mod patch;
mod release;

pub use error::{AcquireError, AcquireResult};
pub use patch::UpdatePatch;
pub use release::RELEASE_DIR_NAME;

use std::path::{Path, PathBuf};

use crate::catalog::UpdateStep;
use crate::version::{Distro, FactorioVersion, ReleaseBuild};

/// Release download endpoint; the full URL is
/// `{base}/{version}/{build}/{distro}`.
const DOWNLOAD_URL: &str = "https://factorio.com/get-download";

/// Patch-link endpoint. Answers with a JSON list of package URLs.
const UPDATE_LINK_URL: &str = "https://updater.factorio.com/get-download-link";

/// Downloads and installs releases and patches.
#[derive(Debug, Clone)]
pub struct ReleaseAcquirer {
    client: reqwest::Client,
    download_url: String,
    update_link_url: String,
}

impl Default for ReleaseAcquirer {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ReleaseAcquirer {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            download_url: DOWNLOAD_URL.to_string(),
            update_link_url: UPDATE_LINK_URL.to_string(),
        }
    }

    /// Override the endpoints. Integration tests point this at a local
    /// fixture server.
    pub fn with_endpoints(
        mut self,
        download_url: impl Into<String>,
        update_link_url: impl Into<String>,
    ) -> Self {
        self.download_url = download_url.into();
        self.update_link_url = update_link_url.into();
        self
    }

    /// Download and extract a full release into `output_dir`, returning the
    /// canonical install directory (`<output_dir>/factorio`).
    pub async fn download_release(
        &self,
        version: FactorioVersion,
        build: ReleaseBuild,
        distro: Distro,
        output_dir: &Path,
    ) -> AcquireResult<PathBuf> {
        release::download_release(
            &self.client,
            &self.download_url,
            version,
            build,
            distro,
            output_dir,
        )
        .await
    }

    /// Download one incremental patch archive into `output_dir`.
    pub async fn download_patch(
        &self,
        step: UpdateStep,
        output_dir: &Path,
    ) -> AcquireResult<UpdatePatch> {
        patch::download_patch(&self.client, &self.update_link_url, step, output_dir).await
    }

    /// Apply one downloaded patch through the installed binary.
    pub async fn apply_patch(
        &self,
        executable: &Path,
        install_dir: &Path,
        update: &UpdatePatch,
    ) -> AcquireResult<()> {
        patch::apply_patch(executable, install_dir, update).await
    }

    /// Walk an install through a patch chain.
    ///
    /// All archives download in parallel up front; application is strictly
    /// sequential because every step depends on the install state the prior
    /// step produced. The first failure aborts the rest — the caller is
    /// expected to fall back to a fresh full download.
    pub async fn update_install(
        &self,
        executable: &Path,
        install_dir: &Path,
        steps: &[UpdateStep],
        updates_dir: &Path,
    ) -> AcquireResult<()> {
        patch::update_install(self, executable, install_dir, steps, updates_dir).await
    }
}
