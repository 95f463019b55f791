//! # sqlsteps
//!
//! Vendor-aware resolution of versioned SQL migration scripts.
//!
//! sqlsteps provides:
//! - Discovery of scripts across filesystem directories and embedded trees
//! - Per-vendor script overrides with a vendor-agnostic fallback
//! - Dense hierarchical versions (`5.0.0.1.2`) from release directories
//! - An ordered, checksummed migration list for any executor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sqlsteps::prelude::*;
//!
//! fn main() -> Result<(), sqlsteps::Error> {
//!     let config = ResolverConfig::new()
//!         .locations(["filesystem:./sql"])
//!         .target_vendor("postgresql");
//!
//!     let migrations = SqlMigrationResolver::new(config).resolve()?;
//!     for migration in &migrations {
//!         println!("{} - {}", migration.version, migration.description);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Resolution pipeline and its building blocks.
pub mod resolve {
    pub use sqlsteps_resolve::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::resolve::{
        MigrationDescriptor, MigrationExecutor, MigrationSource, ResolverConfig, ResourceTree,
        SchemaVersion, SqlMigrationResolver, apply_pending,
    };
}

// Re-export key types at the crate root
pub use resolve::{ResolveError as Error, ResolveResult as Result};
