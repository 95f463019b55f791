//! Migration descriptor assembly.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::checksum::{Checksum, Crc32};
use crate::error::{ResolveError, ResolveResult};
use crate::indexer::IndexedByVersionDir;
use crate::location::ScriptLocation;
use crate::resource::Resource;
use crate::script::IndexedScript;
use crate::version::SchemaVersion;

/// Handle the executor dereferences to obtain a script's SQL.
#[derive(Clone)]
pub struct ScriptContent {
    resource: Arc<dyn Resource>,
}

impl ScriptContent {
    /// Wrap a resource.
    pub fn new(resource: Arc<dyn Resource>) -> Self {
        Self { resource }
    }

    /// Load the raw bytes.
    pub fn bytes(&self) -> ResolveResult<Vec<u8>> {
        self.resource.load_bytes()
    }

    /// Load the script as UTF-8 text.
    pub fn text(&self) -> ResolveResult<String> {
        String::from_utf8(self.bytes()?).map_err(|e| {
            ResolveError::io(
                self.resource.location(),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })
    }
}

impl fmt::Debug for ScriptContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptContent")
            .field(&self.resource.location())
            .finish()
    }
}

/// Where a migration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOrigin {
    /// Root location.
    pub location: ScriptLocation,
    /// Physical path for filesystem scripts, logical path otherwise.
    pub path: String,
    /// Path on disk for filesystem scripts.
    pub physical_path: Option<PathBuf>,
}

impl fmt::Display for ScriptOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A fully resolved migration ready for the executor.
#[derive(Debug, Clone)]
pub struct MigrationDescriptor {
    /// Hierarchical schema version.
    pub version: SchemaVersion,
    /// Human readable description derived from the file name.
    pub description: String,
    /// Checksum of the script bytes.
    pub checksum: u32,
    /// Lazily loaded SQL.
    pub content: ScriptContent,
    /// Diagnostics origin.
    pub origin: ScriptOrigin,
    /// Vendor qualifier of the chosen script.
    pub vendor: Option<String>,
}

impl MigrationDescriptor {
    /// Physical path, if the script is on the filesystem.
    pub fn physical_path(&self) -> Option<&Path> {
        self.origin.physical_path.as_deref()
    }
}

/// Converts indexed scripts into ordered descriptors.
#[derive(Clone)]
pub struct MigrationAssembler {
    checksum: Arc<dyn Checksum>,
    prefix: String,
    suffix: String,
    separator: char,
}

impl Default for MigrationAssembler {
    fn default() -> Self {
        Self::new("", ".sql", '.')
    }
}

impl MigrationAssembler {
    /// Create an assembler using CRC-32 checksums.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, separator: char) -> Self {
        Self {
            checksum: Arc::new(Crc32),
            prefix: prefix.into(),
            suffix: suffix.into(),
            separator,
        }
    }

    /// Use a different checksum function.
    pub fn with_checksum(mut self, checksum: impl Checksum + 'static) -> Self {
        self.checksum = Arc::new(checksum);
        self
    }

    pub(crate) fn with_shared_checksum(mut self, checksum: Arc<dyn Checksum>) -> Self {
        self.checksum = checksum;
        self
    }

    /// Build descriptors sorted ascending by version.
    ///
    /// Fails if two directories normalize to versions that collide.
    pub fn assemble(
        &self,
        indexed: IndexedByVersionDir,
    ) -> ResolveResult<Vec<MigrationDescriptor>> {
        let mut descriptors = indexed
            .into_values()
            .flatten()
            .map(|script| self.descriptor(script))
            .collect::<ResolveResult<Vec<_>>>()?;

        descriptors.sort_by(|a, b| a.version.cmp(&b.version));

        if let Some(pair) = descriptors.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(ResolveError::duplicate_version(
                pair[0].version.to_string(),
                pair[0].origin.to_string(),
                pair[1].origin.to_string(),
            ));
        }

        Ok(descriptors)
    }

    fn descriptor(&self, indexed: IndexedScript) -> ResolveResult<MigrationDescriptor> {
        let IndexedScript {
            script, version, ..
        } = indexed;

        let bytes = script.resource.load_bytes()?;
        let checksum = self.checksum.checksum(&bytes);
        let description = self.describe(&script.file_name);
        debug!(
            "Resolved {} -> {} (checksum {})",
            script.resource_location(),
            version,
            checksum
        );

        let origin = ScriptOrigin {
            location: script.location.clone(),
            path: script.resource.location().to_string(),
            physical_path: script.resource.physical_path().map(Path::to_path_buf),
        };

        Ok(MigrationDescriptor {
            version,
            description,
            checksum,
            content: ScriptContent::new(script.resource),
            origin,
            vendor: script.vendor,
        })
    }

    /// Derive a description from a file name: `1.add_index.sql` becomes
    /// `add index`. Falls back to the file name when nothing is left.
    pub fn describe(&self, file_name: &str) -> String {
        let stem = file_name.strip_suffix(&self.suffix).unwrap_or(file_name);
        let stem = stem.strip_prefix(&self.prefix).unwrap_or(stem);
        let description = stem
            .split_once(self.separator)
            .map(|(_, rest)| rest.replace('_', " "))
            .unwrap_or_default();

        let description = description.trim();
        if description.is_empty() {
            file_name.to_string()
        } else {
            description.to_string()
        }
    }
}
