//! The resolution pipeline.

use std::sync::Arc;

use tracing::info;

use crate::assembler::{MigrationAssembler, MigrationDescriptor};
use crate::checksum::{Checksum, Crc32};
use crate::config::ResolverConfig;
use crate::error::ResolveResult;
use crate::indexer::VersionIndexer;
use crate::locator::ScriptLocator;
use crate::resource::{FileSystemScanner, ResourceScanner, ResourceTree};
use crate::vendor::VendorResolver;

/// Anything that can produce the ordered list of migrations to apply.
pub trait MigrationSource: Send + Sync {
    /// Resolve migrations in ascending version order.
    fn resolve_migrations(&self) -> ResolveResult<Vec<MigrationDescriptor>>;
}

/// Resolves SQL migrations from the configured locations, letting vendor
/// specific scripts override the default ones.
///
/// For the layout
///
/// ```text
/// sql/
/// ├── 5.0.0/
/// │   └── 1.init.sql
/// ├── 5.0.0-M1/
/// │   ├── 1.rename_fields.sql
/// │   ├── 2.add_workspace_constraint.sql
/// │   └── postgresql/
/// │       └── 2.add_workspace_constraint.sql
/// └── 5.0.1/
///     └── 1.stacks_migration.sql
/// ```
///
/// and the target vendor `postgresql`, four migrations are resolved:
/// `5.0.0.1`, `5.0.0.1.1`, `5.0.0.1.2` (the postgresql script) and `5.0.1.1`.
///
/// Several locations may contribute scripts to the same version directory;
/// they are numbered together.
#[derive(Clone)]
pub struct SqlMigrationResolver {
    config: ResolverConfig,
    locator: ScriptLocator,
    checksum: Arc<dyn Checksum>,
}

impl SqlMigrationResolver {
    /// Create a resolver scanning the filesystem only.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            locator: ScriptLocator::default(),
            checksum: Arc::new(Crc32),
        }
    }

    /// Serve `resource:` locations from the given tree.
    pub fn with_resources(mut self, tree: ResourceTree) -> Self {
        self.locator = ScriptLocator::new(FileSystemScanner, tree);
        self
    }

    /// Use custom scanners for both location kinds.
    pub fn with_scanners(
        mut self,
        filesystem: impl ResourceScanner + 'static,
        resources: impl ResourceScanner + 'static,
    ) -> Self {
        self.locator = ScriptLocator::new(filesystem, resources);
        self
    }

    /// Use a different checksum function.
    pub fn with_checksum(mut self, checksum: impl Checksum + 'static) -> Self {
        self.checksum = Arc::new(checksum);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the whole pipeline once.
    pub fn resolve(&self) -> ResolveResult<Vec<MigrationDescriptor>> {
        self.config.validate()?;
        let roots = self.config.script_locations()?;
        info!("Searching for sql scripts in locations {:?}", self.config.locations);

        let found = self.locator.locate(&roots, &self.config.naming_rule())?;
        let effective = VendorResolver.resolve(found, self.config.vendor())?;

        let indexer = VersionIndexer::new(
            self.config.version_separator,
            &self.config.migration_prefix,
        );
        let indexed = indexer.index(effective)?;

        let assembler = MigrationAssembler::new(
            &self.config.migration_prefix,
            &self.config.migration_suffix,
            self.config.version_separator,
        )
        .with_shared_checksum(Arc::clone(&self.checksum));
        let migrations = assembler.assemble(indexed)?;

        info!("Resolved {} migrations", migrations.len());
        Ok(migrations)
    }
}

impl MigrationSource for SqlMigrationResolver {
    fn resolve_migrations(&self) -> ResolveResult<Vec<MigrationDescriptor>> {
        self.resolve()
    }
}
