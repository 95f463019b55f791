//! # sqlsteps-resolve
//!
//! Resolution engine for sqlsteps.
//!
//! This crate turns SQL scripts spread over one or more root locations into a
//! single ordered list of schema migrations:
//! - Script discovery on the filesystem and in embedded resource trees
//! - Vendor specific scripts overriding vendor-agnostic ones
//! - Hierarchical versions derived from release directories and script numbers
//! - Checksums and lazily loaded content for the executor
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌────────────────┐
//! │ ScriptLocator│────▶│ VendorResolver │────▶│ VersionIndexer │
//! └──────────────┘     └────────────────┘     └────────────────┘
//!                                                     │
//!                                                     ▼
//!                      ┌────────────────┐     ┌────────────────────┐
//!                      │    Executor    │◀────│ MigrationAssembler │
//!                      └────────────────┘     └────────────────────┘
//! ```
//!
//! Each stage takes the previous stage's output by value and returns a new
//! structure; nothing is kept between runs.
//!
//! ## Layout
//!
//! ```text
//! sql/
//! ├── 5.0.0/
//! │   └── 1.init.sql                       -> 5.0.0.1
//! ├── 5.0.0-M1/
//! │   ├── 1.rename_fields.sql              -> 5.0.0.1.1
//! │   ├── 2.add_workspace_constraint.sql
//! │   └── postgresql/
//! │       └── 2.add_workspace_constraint.sql -> 5.0.0.1.2 on postgresql
//! └── 5.0.1/
//!     └── 1.stacks_migration.sql           -> 5.0.1.1
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlsteps_resolve::{ResolverConfig, SqlMigrationResolver};
//!
//! let config = ResolverConfig::new()
//!     .locations(["filesystem:./sql"])
//!     .target_vendor("postgresql");
//!
//! for migration in SqlMigrationResolver::new(config).resolve()? {
//!     println!("{} {} ({:08x})", migration.version, migration.description, migration.checksum);
//! }
//! ```

pub mod assembler;
pub mod checksum;
pub mod config;
pub mod error;
pub mod history;
pub mod indexer;
pub mod location;
pub mod locator;
pub mod resolver;
pub mod resource;
pub mod script;
pub mod vendor;
pub mod version;

// Re-exports
pub use assembler::{MigrationAssembler, MigrationDescriptor, ScriptContent, ScriptOrigin};
pub use checksum::{Checksum, Crc32, Sha256Truncated};
pub use config::{NamingRule, ResolverConfig};
pub use error::{ResolveError, ResolveResult};
pub use history::{
    AppliedMigration, ApplyResult, ChecksumDrift, MigrationExecutor, MigrationPlan, apply_pending,
};
pub use indexer::{IndexedByVersionDir, VersionIndexer};
pub use location::{LocationKind, ScriptLocation};
pub use locator::{ScriptLocator, ScriptsByName};
pub use resolver::{MigrationSource, SqlMigrationResolver};
pub use resource::{
    FileSystemResource, FileSystemScanner, Resource, ResourceScanner, ResourceTree, TreeResource,
};
pub use script::{IndexedScript, MigrationScript};
pub use vendor::{DEFAULT_VENDOR, ScriptsByVersionDir, VendorResolver};
pub use version::{SchemaVersion, normalize_version_dir};
