//! Script discovery across root locations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::NamingRule;
use crate::error::{ResolveError, ResolveResult};
use crate::location::{LocationKind, ScriptLocation};
use crate::resource::{FileSystemScanner, Resource, ResourceScanner, ResourceTree};
use crate::script::MigrationScript;

/// Scripts grouped by bare file name, in discovery order within each group.
pub type ScriptsByName = BTreeMap<String, Vec<MigrationScript>>;

/// Finds migration scripts under the configured roots.
///
/// Scripts must live either at `root/<versionDir>/<fileName>` or at
/// `root/<versionDir>/<vendor>/<fileName>`.
#[derive(Clone)]
pub struct ScriptLocator {
    filesystem: Arc<dyn ResourceScanner>,
    resources: Arc<dyn ResourceScanner>,
}

impl Default for ScriptLocator {
    fn default() -> Self {
        Self::new(FileSystemScanner, ResourceTree::new())
    }
}

impl ScriptLocator {
    /// Create a locator with a scanner per location kind.
    pub fn new(
        filesystem: impl ResourceScanner + 'static,
        resources: impl ResourceScanner + 'static,
    ) -> Self {
        Self {
            filesystem: Arc::new(filesystem),
            resources: Arc::new(resources),
        }
    }

    fn scanner(&self, kind: LocationKind) -> &dyn ResourceScanner {
        match kind {
            LocationKind::FileSystem => self.filesystem.as_ref(),
            LocationKind::Resource => self.resources.as_ref(),
        }
    }

    /// Scan every root and group the scripts found by file name.
    ///
    /// Roots are scanned in order and each scanner returns paths sorted, so
    /// every group lists its scripts in root order, then path order.
    pub fn locate(
        &self,
        roots: &[ScriptLocation],
        rule: &NamingRule,
    ) -> ResolveResult<ScriptsByName> {
        let mut scripts = ScriptsByName::new();
        let mut total = 0usize;

        for location in roots {
            debug!("Scanning {} for scripts", location);
            let resources = self.scanner(location.kind()).scan(location, rule)?;
            for resource in resources {
                let script = create_script(resource, location)?;
                scripts
                    .entry(script.file_name.clone())
                    .or_default()
                    .push(script);
                total += 1;
            }
        }

        info!("Found {} scripts in {} locations", total, roots.len());
        Ok(scripts)
    }
}

fn create_script(
    resource: Arc<dyn Resource>,
    location: &ScriptLocation,
) -> ResolveResult<MigrationScript> {
    let sep = location.separator();
    let full = resource.location();
    let relative = full
        .strip_prefix(location.path())
        .map(|rest| rest.strip_prefix(sep).unwrap_or(rest))
        .ok_or_else(|| ResolveError::layout(full, location.path()))?;

    let segments: Vec<&str> = relative.split(sep).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ResolveError::layout(full, location.path()));
    }
    match segments.as_slice() {
        // 5.0.0-M1/1.init.sql
        [version_dir, file_name] => Ok(MigrationScript::new(
            Arc::clone(&resource),
            location.clone(),
            *version_dir,
            None,
            *file_name,
        )),
        // 5.0.0-M1/postgresql/1.init.sql
        [version_dir, vendor, file_name] => Ok(MigrationScript::new(
            Arc::clone(&resource),
            location.clone(),
            *version_dir,
            Some(vendor.to_string()),
            *file_name,
        )),
        _ => Err(ResolveError::layout(full, location.path())),
    }
}
