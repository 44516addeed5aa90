//! Version and install-directory resolution.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::ExecutableConfig;
use crate::version::{Distro, FactorioVersion, ReleaseBuild};

use super::error::SupervisorResult;
use super::traits::{ReleaseProvider, VersionSource};

/// Resolve the version the configuration asks for.
///
/// A literal version string is parsed as-is; `"latest"` is answered by the
/// version API, honoring the experimental-channel flag.
pub(crate) async fn resolve_requested_version(
    source: &dyn VersionSource,
    executable: &ExecutableConfig,
) -> SupervisorResult<FactorioVersion> {
    if executable.version == "latest" {
        let release = source.latest_headless(executable.use_experimental).await?;
        debug!(version = %release.version, "resolved latest headless version");
        return Ok(release.version);
    }

    Ok(executable.version.parse()?)
}

/// Materialize an install directory holding exactly `requested`.
///
/// Decision table against what is on disk:
/// - nothing (or unreadable metadata): fresh download
/// - equal version: reuse as-is, no network involved
/// - greater version: fresh download (upstream publishes no downgrade
///   patches, so there is no cheaper path)
/// - lesser version: walk the published patch chain, falling back to a
///   fresh download when no path exists or any step fails
pub(crate) async fn resolve_install_dir(
    source: &dyn VersionSource,
    provider: &dyn ReleaseProvider,
    executable: &ExecutableConfig,
    requested: FactorioVersion,
) -> SupervisorResult<PathBuf> {
    let install_dir = executable.install_dir();

    let Some(on_disk) = source.installed_release(&install_dir).await else {
        info!(%requested, "no usable install on disk, downloading");
        return download_fresh(provider, executable, requested).await;
    };

    if on_disk.version == requested {
        info!(%requested, path = %install_dir.display(), "install on disk matches requested version");
        return Ok(install_dir);
    }

    if on_disk.version > requested {
        info!(
            on_disk = %on_disk.version,
            %requested,
            "install on disk is newer than requested, downgrading via fresh download"
        );
        return download_fresh(provider, executable, requested).await;
    }

    info!(
        on_disk = %on_disk.version,
        %requested,
        "install on disk is older than requested, attempting incremental update"
    );

    match source.update_path(on_disk.version, requested).await {
        Ok(Some(steps)) => {
            let binary = executable.executable_in(&install_dir);
            match provider
                .update_install(&binary, &install_dir, &steps, &executable.updates_directory)
                .await
            {
                Ok(()) => {
                    info!(%requested, "incremental update complete");
                    Ok(install_dir)
                }
                Err(e) => {
                    warn!(error = %e, "incremental update failed, downloading fresh");
                    download_fresh(provider, executable, requested).await
                }
            }
        }
        Ok(None) => {
            debug!(
                from = %on_disk.version,
                to = %requested,
                "no update path published, downloading fresh"
            );
            download_fresh(provider, executable, requested).await
        }
        Err(e) => {
            warn!(error = %e, "could not fetch update graph, downloading fresh");
            download_fresh(provider, executable, requested).await
        }
    }
}

async fn download_fresh(
    provider: &dyn ReleaseProvider,
    executable: &ExecutableConfig,
    requested: FactorioVersion,
) -> SupervisorResult<PathBuf> {
    let install_dir = provider
        .download_release(
            requested,
            ReleaseBuild::Headless,
            Distro::Linux64,
            &executable.downloads_directory,
        )
        .await?;
    Ok(install_dir)
}
