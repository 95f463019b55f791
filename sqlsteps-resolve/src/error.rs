//! Error types for migration resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while resolving migrations.
///
/// Every variant aborts the whole resolution run; no partial list of
/// migrations is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A scanned script is not laid out as `root/versionDir[/vendor]/fileName`.
    #[error(
        "Script '{path}' must be placed either in 'root/versionDir' or in \
         'root/versionDir/vendor', but it is not in that relation with root '{root}'"
    )]
    Layout {
        /// Offending script location.
        path: String,
        /// Root the script was found under.
        root: String,
    },

    /// Two scripts with the same name register the same vendor.
    #[error(
        "More than one script with name '{name}' is registered for database vendor \
         '{vendor}', script '{script}' conflicts with '{previous}'"
    )]
    DuplicateVendorScript {
        /// Script file name.
        name: String,
        /// Vendor key (`default` when no vendor directory is used).
        vendor: String,
        /// The script registered last.
        script: String,
        /// The script registered first.
        previous: String,
    },

    /// A script name or version directory does not encode a valid version.
    #[error("Invalid version format in '{name}': {reason}")]
    InvalidVersionFormat {
        /// Script file name or version directory.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two effective scripts resolve to the same version.
    #[error("Two scripts provide the same version '{version}': '{first}' and '{second}'")]
    DuplicateVersion {
        /// The clashing version.
        version: String,
        /// Script seen first.
        first: String,
        /// Script seen second.
        second: String,
    },

    /// Storage error while scanning a root or reading a script.
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        /// Path being scanned or read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the migration executor.
    #[error("Execution error: {0}")]
    Execution(String),
}

impl ResolveError {
    /// Create a layout error.
    pub fn layout(path: impl Into<String>, root: impl Into<String>) -> Self {
        Self::Layout {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Create an invalid version format error.
    pub fn invalid_version(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersionFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate version error.
    pub fn duplicate_version(
        version: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateVersion {
            version: version.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Check if this error is fixed by renaming or moving script files.
    pub fn is_layout_problem(&self) -> bool {
        matches!(
            self,
            Self::Layout { .. }
                | Self::DuplicateVendorScript { .. }
                | Self::InvalidVersionFormat { .. }
                | Self::DuplicateVersion { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_display() {
        let err = ResolveError::layout("sql/1.sql", "sql");
        let msg = err.to_string();
        assert!(msg.contains("sql/1.sql"));
        assert!(msg.contains("root 'sql'"));
    }

    #[test]
    fn test_duplicate_vendor_display() {
        let err = ResolveError::DuplicateVendorScript {
            name: "1.init.sql".to_string(),
            vendor: "default".to_string(),
            script: "b/5.0.0/1.init.sql".to_string(),
            previous: "a/5.0.0/1.init.sql".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'default'"));
        assert!(msg.contains("a/5.0.0/1.init.sql"));
        assert!(msg.contains("b/5.0.0/1.init.sql"));
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = ResolveError::io(
            "/tmp/missing.sql",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.sql"));
    }

    #[test]
    fn test_is_layout_problem() {
        assert!(ResolveError::layout("a", "b").is_layout_problem());
        assert!(ResolveError::invalid_version("x.sql", "bad").is_layout_problem());
        assert!(!ResolveError::config("empty").is_layout_problem());
        assert!(!ResolveError::execution("boom").is_layout_problem());
    }
}
