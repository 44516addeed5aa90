//! Release build flavors and platform tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The build flavor of a published release.
///
/// The upstream release API keys its listings by these names; only
/// [`ReleaseBuild::Headless`] is ever run by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseBuild {
    /// The full game client.
    Alpha,
    /// The demo client.
    Demo,
    /// The server-only build with no graphics stack.
    Headless,
}

impl ReleaseBuild {
    /// The name used in download URLs and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Demo => "demo",
            Self::Headless => "headless",
        }
    }
}

impl fmt::Display for ReleaseBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseBuild {
    type Err = UnknownBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(Self::Alpha),
            "demo" => Ok(Self::Demo),
            "headless" => Ok(Self::Headless),
            other => Err(UnknownBuildError(other.to_string())),
        }
    }
}

/// Error for an unrecognized build name in an API payload.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown release build {0:?}")]
pub struct UnknownBuildError(String);

/// Platform/architecture tag used in download URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distro {
    /// 64-bit Linux, the reference platform for the headless server.
    Linux64,
    Win64,
    Osx,
}

impl Distro {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux64 => "linux64",
            Self::Win64 => "win64",
            Self::Osx => "osx",
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_round_trip() {
        for build in [
            ReleaseBuild::Alpha,
            ReleaseBuild::Demo,
            ReleaseBuild::Headless,
        ] {
            assert_eq!(build.as_str().parse::<ReleaseBuild>().unwrap(), build);
        }
    }

    #[test]
    fn test_build_unknown() {
        assert!("expansion".parse::<ReleaseBuild>().is_err());
    }

    #[test]
    fn test_distro_display() {
        assert_eq!(Distro::Linux64.to_string(), "linux64");
    }
}
