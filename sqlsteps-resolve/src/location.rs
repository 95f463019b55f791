//! Script root locations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ResolveResult};

const FILESYSTEM_PREFIX: &str = "filesystem:";
const RESOURCE_PREFIX: &str = "resource:";
const CLASSPATH_PREFIX: &str = "classpath:";

/// Kind of storage a location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// A directory on the local filesystem.
    FileSystem,
    /// A logical resource tree, e.g. scripts embedded into the binary.
    Resource,
}

impl LocationKind {
    /// Separator used in paths relative to a root of this kind.
    pub fn separator(self) -> char {
        match self {
            Self::FileSystem => std::path::MAIN_SEPARATOR,
            Self::Resource => '/',
        }
    }
}

/// A configured root under which migration scripts live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptLocation {
    kind: LocationKind,
    path: String,
}

impl ScriptLocation {
    /// Create a filesystem location.
    pub fn filesystem(path: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::FileSystem,
            path: trim_trailing(path.into(), std::path::MAIN_SEPARATOR),
        }
    }

    /// Create a resource tree location.
    pub fn resource(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = path.trim_start_matches('/').to_string();
        Self {
            kind: LocationKind::Resource,
            path: trim_trailing(path, '/'),
        }
    }

    /// Parse a location descriptor.
    ///
    /// `filesystem:<path>` and `resource:<path>` (or `classpath:<path>`) select
    /// the kind explicitly; anything else is a filesystem path.
    pub fn parse(raw: &str) -> ResolveResult<Self> {
        let raw = raw.trim();
        let location = if let Some(path) = raw.strip_prefix(FILESYSTEM_PREFIX) {
            Self::filesystem(path)
        } else if let Some(path) = raw
            .strip_prefix(RESOURCE_PREFIX)
            .or_else(|| raw.strip_prefix(CLASSPATH_PREFIX))
        {
            Self::resource(path)
        } else {
            Self::filesystem(raw)
        };

        if location.path.is_empty() {
            return Err(ResolveError::config(format!(
                "location '{}' has an empty path",
                raw
            )));
        }
        Ok(location)
    }

    /// Get the location kind.
    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    /// Get the root path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if the location is on the filesystem.
    pub fn is_filesystem(&self) -> bool {
        self.kind == LocationKind::FileSystem
    }

    /// Separator for paths relative to this root.
    pub fn separator(&self) -> char {
        self.kind.separator()
    }
}

fn trim_trailing(mut path: String, sep: char) -> String {
    while path.len() > 1 && path.ends_with(sep) {
        path.pop();
    }
    path
}

impl FromStr for ScriptLocation {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LocationKind::FileSystem => write!(f, "{}{}", FILESYSTEM_PREFIX, self.path),
            LocationKind::Resource => write!(f, "{}{}", RESOURCE_PREFIX, self.path),
        }
    }
}
