//! Incremental patch download and application.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::catalog::UpdateStep;

use super::download::download_to;
use super::error::{AcquireError, AcquireResult};
use super::ReleaseAcquirer;

/// The package name the updater publishes headless Linux patches under.
const UPDATER_PACKAGE: &str = "core-linux_headless64";

/// One downloaded incremental-patch artifact.
#[derive(Debug, Clone)]
pub struct UpdatePatch {
    pub step: UpdateStep,
    /// The downloaded archive on disk.
    pub archive: PathBuf,
}

pub(crate) async fn download_patch(
    client: &reqwest::Client,
    link_url: &str,
    step: UpdateStep,
    output_dir: &Path,
) -> AcquireResult<UpdatePatch> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| AcquireError::CreateDirFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

    // The link endpoint answers with a list of package URLs; anything other
    // than exactly one leaves us without a defined artifact to fetch.
    let url = format!(
        "{}?from={}&to={}&apiVersion=2&package={}",
        link_url, step.from, step.to, UPDATER_PACKAGE
    );

    let package_urls: Vec<String> = client
        .get(&url)
        .send()
        .await
        .map_err(|e| AcquireError::PatchLinkFailed {
            step,
            reason: e.to_string(),
        })?
        .error_for_status()
        .map_err(|e| AcquireError::PatchLinkFailed {
            step,
            reason: e.to_string(),
        })?
        .json()
        .await
        .map_err(|e| AcquireError::PatchLinkFailed {
            step,
            reason: format!("malformed link list: {}", e),
        })?;

    let package_url = match package_urls.as_slice() {
        [single] => single,
        [] => {
            return Err(AcquireError::PatchLinkFailed {
                step,
                reason: "no download links returned".to_string(),
            })
        }
        many => {
            return Err(AcquireError::PatchLinkFailed {
                step,
                reason: format!("{} download links returned, expected one", many.len()),
            })
        }
    };

    let archive = output_dir.join(format!("{}-{}-update.zip", step.from, step.to));
    download_to(client, package_url, &archive).await?;

    debug!(%step, archive = %archive.display(), "patch downloaded");
    Ok(UpdatePatch { step, archive })
}

pub(crate) async fn apply_patch(
    executable: &Path,
    install_dir: &Path,
    update: &UpdatePatch,
) -> AcquireResult<()> {
    info!(step = %update.step, "applying update");

    let output = Command::new(executable)
        .arg("--apply-update")
        .arg(&update.archive)
        .current_dir(install_dir)
        .output()
        .await
        .map_err(|e| AcquireError::PatchApplyFailed {
            step: update.step,
            reason: format!("failed to run {}: {}", executable.display(), e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AcquireError::PatchApplyFailed {
            step: update.step,
            reason: format!("exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(())
}

pub(crate) async fn update_install(
    acquirer: &ReleaseAcquirer,
    executable: &Path,
    install_dir: &Path,
    steps: &[UpdateStep],
    updates_dir: &Path,
) -> AcquireResult<()> {
    if steps.is_empty() {
        return Ok(());
    }

    // Archives are independent of install state, so they can all download
    // concurrently; application cannot.
    let downloads = steps
        .iter()
        .map(|step| acquirer.download_patch(*step, updates_dir));
    let patches = try_join_all(downloads).await?;

    for update in &patches {
        apply_patch(executable, install_dir, update).await?;

        if let Err(e) = tokio::fs::remove_file(&update.archive).await {
            warn!(
                archive = %update.archive.display(),
                error = %e,
                "could not delete applied patch archive"
            );
        }
    }

    Ok(())
}
