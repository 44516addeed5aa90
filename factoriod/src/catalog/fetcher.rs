//! Queries against the release-listing and updater APIs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::version::{FactorioVersion, InstalledRelease, Release, ReleaseBuild};

use super::error::{CatalogError, CatalogResult};
use super::updates::{AvailableUpdateEntry, UpdateGraph, UpdateStep};

/// Release-listing endpoint.
const RELEASES_URL: &str = "https://factorio.com/api/latest-releases";

/// Update-availability endpoint.
const UPDATES_URL: &str = "https://updater.factorio.com/get-available-versions";

/// Relative path of the metadata file identifying an install's version.
const BASE_INFO_PATH: &str = "data/base/info.json";

/// Client for the published-version APIs.
///
/// Holds nothing but an HTTP client and the endpoint URLs; every query hits
/// the network. Callers that can tolerate staleness are expected to hold on
/// to the answer themselves.
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    client: reqwest::Client,
    releases_url: String,
    updates_url: String,
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

/// Shape of the release-listing payload: one map of build name to version
/// per publication channel.
#[derive(Debug, Deserialize)]
struct LatestReleases {
    #[serde(default)]
    experimental: BTreeMap<String, FactorioVersion>,
    #[serde(default)]
    stable: BTreeMap<String, FactorioVersion>,
}

/// Shape of the update-availability payload.
#[derive(Debug, Deserialize)]
struct AvailableVersions {
    #[serde(default, rename = "core-linux_headless64")]
    core_linux_headless64: Vec<AvailableUpdateEntry>,
}

/// Shape of an install's `data/base/info.json` (only the version matters).
#[derive(Debug, Deserialize)]
struct BaseInfo {
    version: FactorioVersion,
}

impl VersionCatalog {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            releases_url: RELEASES_URL.to_string(),
            updates_url: UPDATES_URL.to_string(),
        }
    }

    /// Override the API endpoints. Integration tests point this at a local
    /// fixture server.
    pub fn with_endpoints(
        mut self,
        releases_url: impl Into<String>,
        updates_url: impl Into<String>,
    ) -> Self {
        self.releases_url = releases_url.into();
        self.updates_url = updates_url.into();
        self
    }

    /// List published releases across all builds.
    ///
    /// Entries follow the payload's channel order: experimental first (when
    /// included), then stable. Within a channel the build order is the
    /// payload's own.
    pub async fn list_versions(&self, include_experimental: bool) -> CatalogResult<Vec<Release>> {
        let url = &self.releases_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::http(url, e))?
            .error_for_status()
            .map_err(|e| CatalogError::http(url, e))?;

        let listing: LatestReleases = response
            .json()
            .await
            .map_err(|e| CatalogError::malformed(url, e))?;

        Ok(flatten_listing(listing, include_experimental))
    }

    /// The most recent published headless release.
    pub async fn latest_headless(&self, include_experimental: bool) -> CatalogResult<Release> {
        self.list_versions(include_experimental)
            .await?
            .into_iter()
            .find(|release| release.build == ReleaseBuild::Headless)
            .ok_or(CatalogError::NotFound)
    }

    /// Identify the release installed in `dir`, if any.
    ///
    /// An install is only trusted when its `data/base/info.json` parses to a
    /// version; anything else is `None`. The `stable` flag is computed
    /// against the latest published stable headless version — when that
    /// lookup fails the install is assumed stable rather than failing the
    /// whole probe.
    pub async fn installed_release(&self, dir: &Path) -> Option<InstalledRelease> {
        let info_path = dir.join(BASE_INFO_PATH);
        let contents = tokio::fs::read_to_string(&info_path).await.ok()?;
        let info: BaseInfo = serde_json::from_str(&contents).ok()?;

        let stable = match self.latest_headless(false).await {
            Ok(latest) => info.version >= latest.version,
            Err(e) => {
                debug!(error = %e, "could not fetch latest stable version, assuming install is stable");
                true
            }
        };

        Some(InstalledRelease::new(
            Release::new(info.version, ReleaseBuild::Headless, stable),
            dir,
        ))
    }

    /// Fetch the update graph and chain `from` to exactly `to`.
    ///
    /// `Ok(None)` means the graph holds no path; `Ok(Some(vec![]))` only
    /// occurs when `from == to`.
    pub async fn update_path(
        &self,
        from: FactorioVersion,
        to: FactorioVersion,
    ) -> CatalogResult<Option<Vec<UpdateStep>>> {
        let graph = self.available_updates().await?;
        Ok(graph.path(from, to))
    }

    /// Fetch the raw update-availability graph for the headless package.
    pub async fn available_updates(&self) -> CatalogResult<UpdateGraph> {
        let url = &self.updates_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::http(url, e))?
            .error_for_status()
            .map_err(|e| CatalogError::http(url, e))?;

        let available: AvailableVersions = response
            .json()
            .await
            .map_err(|e| CatalogError::malformed(url, e))?;

        Ok(UpdateGraph::from_entries(available.core_linux_headless64))
    }
}

fn flatten_listing(listing: LatestReleases, include_experimental: bool) -> Vec<Release> {
    let channels = [
        (listing.experimental, false),
        (listing.stable, true),
    ];

    let mut releases = Vec::new();
    for (builds, stable) in channels {
        if !stable && !include_experimental {
            continue;
        }
        for (build_name, version) in builds {
            // Unknown build names are skipped so a new upstream flavor does
            // not break version resolution.
            if let Ok(build) = build_name.parse::<ReleaseBuild>() {
                releases.push(Release::new(version, build, stable));
            }
        }
    }

    releases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> FactorioVersion {
        s.parse().unwrap()
    }

    fn sample_listing() -> LatestReleases {
        serde_json::from_str(
            r#"{
                "experimental": {"alpha": "2.0.20", "demo": "2.0.20", "headless": "2.0.20"},
                "stable": {"alpha": "1.1.110", "demo": "1.1.110", "headless": "1.1.110"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_flatten_stable_only() {
        let releases = flatten_listing(sample_listing(), false);
        assert_eq!(releases.len(), 3);
        assert!(releases.iter().all(|r| r.stable));
        assert!(releases.iter().all(|r| r.version == v("1.1.110")));
    }

    #[test]
    fn test_flatten_experimental_comes_first() {
        let releases = flatten_listing(sample_listing(), true);
        assert_eq!(releases.len(), 6);
        assert!(!releases[0].stable);
        assert!(releases[5].stable);
    }

    #[test]
    fn test_first_headless_prefers_experimental_channel() {
        let releases = flatten_listing(sample_listing(), true);
        let headless = releases
            .iter()
            .find(|r| r.build == ReleaseBuild::Headless)
            .unwrap();
        assert_eq!(headless.version, v("2.0.20"));
        assert!(!headless.stable);
    }

    #[test]
    fn test_unknown_build_names_are_skipped() {
        let listing: LatestReleases = serde_json::from_str(
            r#"{"stable": {"headless": "1.1.110", "expansion": "9.9.9"}}"#,
        )
        .unwrap();
        let releases = flatten_listing(listing, false);
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].build, ReleaseBuild::Headless);
    }

    #[test]
    fn test_empty_listing_flattens_to_nothing() {
        let listing: LatestReleases = serde_json::from_str("{}").unwrap();
        assert!(flatten_listing(listing, true).is_empty());
    }

    #[tokio::test]
    async fn test_installed_release_requires_readable_metadata() {
        let temp = tempfile::TempDir::new().unwrap();
        let catalog = VersionCatalog::default()
            .with_endpoints("http://127.0.0.1:0/releases", "http://127.0.0.1:0/updates");

        // no metadata at all
        assert!(catalog.installed_release(temp.path()).await.is_none());

        // unreadable metadata is absence, not an error
        let base = temp.path().join("data/base");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("info.json"), "{broken").unwrap();
        assert!(catalog.installed_release(temp.path()).await.is_none());

        // readable metadata is trusted even when the listing endpoint is
        // unreachable (stability defaults to true)
        std::fs::write(base.join("info.json"), r#"{"version": "1.1.110"}"#).unwrap();
        let installed = catalog.installed_release(temp.path()).await.unwrap();
        assert_eq!(installed.version, v("1.1.110"));
        assert!(installed.stable);
    }
}
