//! Full release download and extraction.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::version::{Distro, FactorioVersion, ReleaseBuild};

use super::download::download_to;
use super::error::{AcquireError, AcquireResult};

/// Directory name the release archive carries at its top level; the
/// canonical install lives under this name in the downloads root.
pub const RELEASE_DIR_NAME: &str = "factorio";

/// Staging name of the downloaded archive.
const ARCHIVE_NAME: &str = "factorio.tar.xz";

/// Directory extraction stages into before the canonical rename.
const STAGING_DIR_NAME: &str = ".factorio.staging";

pub(crate) async fn download_release(
    client: &reqwest::Client,
    base_url: &str,
    version: FactorioVersion,
    build: ReleaseBuild,
    distro: Distro,
    output_dir: &Path,
) -> AcquireResult<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| AcquireError::CreateDirFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let url = format!("{}/{}/{}/{}", base_url, version, build, distro);
    let archive = output_dir.join(ARCHIVE_NAME);

    info!(%version, %build, %distro, "downloading release");
    download_to(client, &url, &archive).await?;

    let install_dir = output_dir.join(RELEASE_DIR_NAME);
    let result = extract_into_place(&archive, output_dir, &install_dir).await;

    // The archive is staging state either way; only the canonical directory
    // carries the outcome.
    tokio::fs::remove_file(&archive).await.ok();

    result?;
    info!(path = %install_dir.display(), "release installed");
    Ok(install_dir)
}

/// Extract the archive into a staging directory, then swing it to the
/// canonical name. The canonical directory is only touched once a complete
/// extraction exists next to it.
async fn extract_into_place(
    archive: &Path,
    output_dir: &Path,
    install_dir: &Path,
) -> AcquireResult<()> {
    let staging = output_dir.join(STAGING_DIR_NAME);
    if staging.exists() {
        tokio::fs::remove_dir_all(&staging)
            .await
            .map_err(|source| AcquireError::WriteFailed {
                path: staging.clone(),
                source,
            })?;
    }
    tokio::fs::create_dir_all(&staging)
        .await
        .map_err(|source| AcquireError::CreateDirFailed {
            path: staging.clone(),
            source,
        })?;

    let extraction = extract_tar(archive, &staging).await;

    match extraction {
        Ok(()) => {
            let extracted = staging.join(RELEASE_DIR_NAME);
            if !extracted.is_dir() {
                tokio::fs::remove_dir_all(&staging).await.ok();
                return Err(AcquireError::ExtractionFailed {
                    archive: archive.to_path_buf(),
                    reason: format!("archive did not contain a {:?} directory", RELEASE_DIR_NAME),
                });
            }

            if install_dir.exists() {
                tokio::fs::remove_dir_all(install_dir).await.map_err(|source| {
                    AcquireError::WriteFailed {
                        path: install_dir.to_path_buf(),
                        source,
                    }
                })?;
            }

            tokio::fs::rename(&extracted, install_dir)
                .await
                .map_err(|source| AcquireError::WriteFailed {
                    path: install_dir.to_path_buf(),
                    source,
                })?;

            tokio::fs::remove_dir_all(&staging).await.ok();
            Ok(())
        }
        Err(e) => {
            tokio::fs::remove_dir_all(&staging).await.ok();
            Err(e)
        }
    }
}

/// Run the system `tar` to unpack an `.tar.xz` archive.
///
/// Shelling out matches how the archives are produced upstream and keeps
/// xz support out of the dependency tree.
async fn extract_tar(archive: &Path, dest_dir: &Path) -> AcquireResult<()> {
    debug!(archive = %archive.display(), dest = %dest_dir.display(), "extracting");

    let output = Command::new("tar")
        .arg("-xJf")
        .arg(archive)
        .arg("-C")
        .arg(dest_dir)
        .output()
        .await
        .map_err(|e| AcquireError::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: format!("failed to run tar: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AcquireError::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: format!("tar exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(())
}
