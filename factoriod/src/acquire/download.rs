//! Streaming HTTP download to a file.

use std::path::Path;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::{AcquireError, AcquireResult};

/// Stream `url` to `dest`, creating parent directories as needed.
///
/// Returns the number of bytes written. The destination is truncated on
/// entry, so a failed download leaves at worst a partial file at a staging
/// path — callers never hand this function a canonical location.
pub(crate) async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> AcquireResult<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AcquireError::CreateDirFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AcquireError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .error_for_status()
        .map_err(|e| AcquireError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut file = File::create(dest)
        .await
        .map_err(|source| AcquireError::WriteFailed {
            path: dest.to_path_buf(),
            source,
        })?;

    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AcquireError::DownloadFailed {
            url: url.to_string(),
            reason: format!("read error: {}", e),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| AcquireError::WriteFailed {
                path: dest.to_path_buf(),
                source,
            })?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|source| AcquireError::WriteFailed {
            path: dest.to_path_buf(),
            source,
        })?;

    debug!(url, dest = %dest.display(), bytes = written, "download complete");
    Ok(written)
}
