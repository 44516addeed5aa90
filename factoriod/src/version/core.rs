//! The Factorio version number.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A Factorio version number: `major.minor.patch` with an optional fourth
/// build component (`1.1.110` or `1.1.110.4321`).
///
/// Ordering and equality treat a missing build component as `0`, so
/// `1.1.110` compares equal to `1.1.110.0`. Display preserves whether the
/// build component was present.
///
/// # Example
///
/// ```
/// use factoriod::version::FactorioVersion;
///
/// let version: FactorioVersion = "1.1.110".parse().unwrap();
/// assert_eq!(version.to_string(), "1.1.110");
/// assert!(version > "1.1.109".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FactorioVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Build component, present only in four-part version strings.
    pub build: Option<u32>,
}

impl FactorioVersion {
    /// Create a three-part version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: None,
        }
    }

    /// Create a four-part version.
    pub const fn with_build(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: Some(build),
        }
    }

    fn key(&self) -> (u32, u32, u32, u32) {
        (self.major, self.minor, self.patch, self.build.unwrap_or(0))
    }
}

impl PartialEq for FactorioVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FactorioVersion {}

impl PartialOrd for FactorioVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactorioVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for FactorioVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for FactorioVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }
        Ok(())
    }
}

/// Error returned when a version string does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Factorio version {input:?}: {reason}")]
pub struct ParseVersionError {
    input: String,
    reason: &'static str,
}

impl ParseVersionError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl FromStr for FactorioVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = s.split('.');
        let mut next = |name| {
            components
                .next()
                .ok_or(name)
                .and_then(|part| part.parse::<u32>().map_err(|_| name))
        };

        let major = next("missing or non-numeric major component")
            .map_err(|reason| ParseVersionError::new(s, reason))?;
        let minor = next("missing or non-numeric minor component")
            .map_err(|reason| ParseVersionError::new(s, reason))?;
        let patch = next("missing or non-numeric patch component")
            .map_err(|reason| ParseVersionError::new(s, reason))?;

        let build = match components.next() {
            None => None,
            Some(part) => Some(
                part.parse::<u32>()
                    .map_err(|_| ParseVersionError::new(s, "non-numeric build component"))?,
            ),
        };

        if components.next().is_some() {
            return Err(ParseVersionError::new(s, "more than four components"));
        }

        Ok(Self {
            major,
            minor,
            patch,
            build,
        })
    }
}

impl Serialize for FactorioVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FactorioVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_part() {
        let version: FactorioVersion = "1.1.110".parse().unwrap();
        assert_eq!(version, FactorioVersion::new(1, 1, 110));
        assert_eq!(version.build, None);
    }

    #[test]
    fn test_parse_four_part() {
        let version: FactorioVersion = "2.0.15.4321".parse().unwrap();
        assert_eq!(version, FactorioVersion::with_build(2, 0, 15, 4321));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<FactorioVersion>().is_err());
        assert!("1.1".parse::<FactorioVersion>().is_err());
        assert!("1.1.x".parse::<FactorioVersion>().is_err());
        assert!("1.1.1.1.1".parse::<FactorioVersion>().is_err());
        assert!("1.-1.0".parse::<FactorioVersion>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for input in ["0.17.79", "1.1.110", "2.0.15.4321"] {
            let version: FactorioVersion = input.parse().unwrap();
            assert_eq!(version.to_string(), input);
        }
    }

    #[test]
    fn test_ordering() {
        let parse = |s: &str| s.parse::<FactorioVersion>().unwrap();
        assert!(parse("1.1.110") > parse("1.1.109"));
        assert!(parse("2.0.0") > parse("1.1.110"));
        assert!(parse("1.2.0") > parse("1.1.110"));
        assert!(parse("1.1.110.1") > parse("1.1.110"));
    }

    #[test]
    fn test_missing_build_compares_as_zero() {
        let bare: FactorioVersion = "1.1.110".parse().unwrap();
        let zero: FactorioVersion = "1.1.110.0".parse().unwrap();
        assert_eq!(bare, zero);
        assert_eq!(bare.cmp(&zero), Ordering::Equal);
    }

    #[test]
    fn test_serde_as_string() {
        let version: FactorioVersion = serde_json::from_str("\"1.1.110\"").unwrap();
        assert_eq!(version, FactorioVersion::new(1, 1, 110));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"1.1.110\"");
    }
}
