//! Semantic-version value type

use std::fmt;
use std::str::FromStr;

/// The version of this library.
pub const CURRENT: Version = Version::new(0, 1, 0);

/// A `major.minor.patch` semantic version.
///
/// Ordering is lexicographic over the fields, so derived comparisons give
/// the expected precedence (`1.0.0 < 1.0.1 < 1.1.0 < 2.0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Incompatible API changes.
    pub major: u64,
    /// Backwards-compatible functionality.
    pub minor: u64,
    /// Backwards-compatible fixes.
    pub patch: u64,
}

impl Version {
    /// Create a version from its three components.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version string: {0:?}")]
pub struct ParseVersionError(pub String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn component(part: Option<&str>, s: &str) -> Result<u64, ParseVersionError> {
            part.and_then(|p| p.parse().ok())
                .ok_or_else(|| ParseVersionError(s.to_string()))
        }

        let mut parts = s.split('.');
        let major = component(parts.next(), s)?;
        let minor = component(parts.next(), s)?;
        let patch = component(parts.next(), s)?;
        if parts.next().is_some() {
            return Err(ParseVersionError(s.to_string()));
        }
        Ok(Version::new(major, minor, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Version::new(1, 0, 0) < Version::new(1, 0, 1));
        assert!(Version::new(1, 0, 1) < Version::new(1, 1, 0));
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
        assert_eq!(Version::new(0, 1, 0), Version::new(0, 1, 0));
        assert!(Version::new(2, 0, 0) >= Version::new(1, 9, 9));
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(CURRENT.to_string(), "0.1.0");
    }

    #[test]
    fn test_parse_roundtrip() {
        let version: Version = "10.4.2".parse().unwrap();
        assert_eq!(version, Version::new(10, 4, 2));
        assert_eq!(version.to_string().parse::<Version>().unwrap(), version);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.two.3".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
    }
}
