//! Hierarchical schema versions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{ResolveError, ResolveResult};

/// A dot separated version compared component by component, numerically.
///
/// `5.0.0.1.2 < 5.0.1.1` and `1.10 > 1.9`. A version sorts before any
/// longer version it prefixes, so `5.0.0` and `5.0.0.0` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaVersion {
    parts: Vec<u64>,
}

impl SchemaVersion {
    /// Parse a version string such as `5.0.0.1`.
    pub fn parse(raw: &str) -> ResolveResult<Self> {
        if raw.is_empty() {
            return Err(ResolveError::invalid_version(raw, "version is empty"));
        }

        let parts = raw
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ResolveError::invalid_version(
                        raw,
                        format!("'{}' is not a numeric version component", part),
                    ));
                }
                part.parse::<u64>().map_err(|e| {
                    ResolveError::invalid_version(raw, format!("component '{}': {}", part, e))
                })
            })
            .collect::<ResolveResult<Vec<_>>>()?;

        Ok(Self { parts })
    }

    /// Version components.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Append a sub-version component.
    pub fn child(&self, index: u64) -> Self {
        let mut parts = self.parts.clone();
        parts.push(index);
        Self { parts }
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for SchemaVersion {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalize a version directory name into a version prefix.
///
/// Dashes become dots, then every character that is neither a digit nor a
/// dot is deleted: `5.0.0-M1` becomes `5.0.0.1`.
pub fn normalize_version_dir(version_dir: &str) -> String {
    version_dir
        .replace('-', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Normalize and parse a version directory name.
pub fn parse_version_dir(version_dir: &str) -> ResolveResult<SchemaVersion> {
    let normalized = normalize_version_dir(version_dir);
    SchemaVersion::parse(&normalized).map_err(|_| {
        ResolveError::invalid_version(
            version_dir,
            format!(
                "version directory normalizes to '{}', which is not a valid version",
                normalized
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_version_dir() {
        assert_eq!(normalize_version_dir("5.0.0-M1"), "5.0.0.1");
        assert_eq!(normalize_version_dir("5.0.1"), "5.0.1");
        assert_eq!(normalize_version_dir("1.0-rc2"), "1.0.2");
        assert_eq!(normalize_version_dir("latest"), "");
    }

    #[test]
    fn test_parse_and_display() {
        let v = SchemaVersion::parse("5.0.0.1").unwrap();
        assert_eq!(v.parts(), &[5, 0, 0, 1]);
        assert_eq!(v.to_string(), "5.0.0.1");
        assert_eq!(v.child(2).to_string(), "5.0.0.1.2");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(SchemaVersion::parse("").is_err());
        assert!(SchemaVersion::parse("5..1").is_err());
        assert!(SchemaVersion::parse("5.0.").is_err());
        assert!(SchemaVersion::parse("5.a").is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let v = |s: &str| SchemaVersion::parse(s).unwrap();
        assert!(v("5.0.0.1") < v("5.0.0.1.1"));
        assert!(v("5.0.0.1.2") < v("5.0.1.1"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("5.0.0") < v("5.0.0.0"));
        assert_ne!(v("5.0"), v("5.0.0"));
    }

    #[test]
    fn test_parse_version_dir_errors_name_the_directory() {
        let err = parse_version_dir("latest").unwrap_err();
        assert!(err.to_string().contains("latest"));
        assert!(parse_version_dir("5.0.0-").is_err());
        assert_eq!(parse_version_dir("5.0.0-M1").unwrap().to_string(), "5.0.0.1");
    }
}
