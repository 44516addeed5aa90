//! Published and installed release types.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use super::core::FactorioVersion;
use super::types::ReleaseBuild;

/// A release as published by the version API.
///
/// `stable` is the publication channel of the entry: releases listed under
/// the stable channel carry `true`, experimental releases `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub version: FactorioVersion,
    pub build: ReleaseBuild,
    pub stable: bool,
}

impl Release {
    pub fn new(version: FactorioVersion, build: ReleaseBuild, stable: bool) -> Self {
        Self {
            version,
            build,
            stable,
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.version,
            self.build,
            if self.stable { "stable" } else { "experimental" }
        )
    }
}

/// A release materialized on disk.
///
/// Contains a [`Release`] rather than extending it; the [`Deref`]
/// implementation allows transparent access to the release fields, so
/// `installed.version` works without going through `installed.release`.
///
/// An `InstalledRelease` is only ever constructed from a directory whose
/// embedded metadata (`data/base/info.json`) was actually readable; a
/// directory that fails that check is treated as having no install at all.
#[derive(Debug, Clone)]
pub struct InstalledRelease {
    /// The release identity read from the install's metadata.
    pub release: Release,

    /// Root directory of the install (the directory containing `bin/`
    /// and `data/`).
    pub path: PathBuf,
}

impl InstalledRelease {
    pub fn new(release: Release, path: impl Into<PathBuf>) -> Self {
        Self {
            release,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for InstalledRelease {
    type Target = Release;

    fn deref(&self) -> &Self::Target {
        &self.release
    }
}

impl AsRef<Release> for InstalledRelease {
    fn as_ref(&self) -> &Release {
        &self.release
    }
}
