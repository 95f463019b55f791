//! Discovered migration scripts.

use std::fmt;
use std::sync::Arc;

use crate::location::ScriptLocation;
use crate::resource::Resource;
use crate::version::SchemaVersion;

/// A script found under a root location.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// Root the script was found under.
    pub location: ScriptLocation,
    /// Backing resource.
    pub resource: Arc<dyn Resource>,
    /// Release directory, e.g. `5.0.0-M1`.
    pub version_dir: String,
    /// Vendor qualifier, `None` for vendor-agnostic scripts.
    pub vendor: Option<String>,
    /// Bare file name, e.g. `1.init.sql`.
    pub file_name: String,
}

impl MigrationScript {
    /// Create a script.
    pub fn new(
        resource: Arc<dyn Resource>,
        location: ScriptLocation,
        version_dir: impl Into<String>,
        vendor: Option<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            location,
            resource,
            version_dir: version_dir.into(),
            vendor,
            file_name: file_name.into(),
        }
    }

    /// Full location of the backing resource.
    pub fn resource_location(&self) -> &str {
        self.resource.location()
    }
}

impl PartialEq for MigrationScript {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && self.resource.location() == other.resource.location()
            && self.version_dir == other.version_dir
            && self.vendor == other.vendor
            && self.file_name == other.file_name
    }
}

impl Eq for MigrationScript {}

impl fmt::Display for MigrationScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.resource.location(), self.location)
    }
}

/// A script with its position in the final version sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedScript {
    /// The effective script.
    pub script: MigrationScript,
    /// Integer parsed from the file name.
    pub numeric_index: u32,
    /// 1-based rank of `numeric_index` within the version directory.
    pub index: u32,
    /// Final hierarchical version.
    pub version: SchemaVersion,
}
