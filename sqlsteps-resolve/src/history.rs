//! Planning against the executor's schema history.
//!
//! This is an optional convenience layer on top of resolution. Resolving
//! migrations never touches it: [`SqlMigrationResolver`] returns the ordered
//! descriptors and callers are free to diff them against their own history
//! and run them with their own engine.
//!
//! The executor owns the history table and everything that touches the live
//! database. This module only diffs resolved migrations against what the
//! executor reports as applied, and drives it in version order.
//!
//! [`SqlMigrationResolver`]: crate::resolver::SqlMigrationResolver

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, warn};

use crate::assembler::MigrationDescriptor;
use crate::error::{ResolveError, ResolveResult};
use crate::resolver::MigrationSource;
use crate::version::SchemaVersion;

/// A migration the executor reports as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Applied version.
    pub version: SchemaVersion,
    /// Checksum recorded when it was applied.
    pub checksum: u32,
}

impl AppliedMigration {
    /// Create a record.
    pub fn new(version: SchemaVersion, checksum: u32) -> Self {
        Self { version, checksum }
    }
}

/// The external engine that applies migrations to a database.
#[async_trait::async_trait]
pub trait MigrationExecutor: Send + Sync {
    /// Report the migrations already applied.
    async fn applied_migrations(&self) -> ResolveResult<Vec<AppliedMigration>>;

    /// Apply one migration and record it.
    async fn apply(&self, migration: &MigrationDescriptor) -> ResolveResult<()>;
}

/// An applied migration whose script has changed since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumDrift {
    /// Migration version.
    pub version: SchemaVersion,
    /// Checksum in the schema history.
    pub expected: u32,
    /// Checksum of the current script.
    pub actual: u32,
}

/// Difference between resolved migrations and the schema history.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Migrations not applied yet, in version order.
    pub pending: Vec<MigrationDescriptor>,
    /// Applied migrations whose scripts changed.
    pub drifted: Vec<ChecksumDrift>,
    /// Applied versions that no longer resolve to a script.
    pub missing: Vec<SchemaVersion>,
}

impl MigrationPlan {
    /// Diff resolved migrations against applied ones.
    pub fn build(migrations: Vec<MigrationDescriptor>, applied: &[AppliedMigration]) -> Self {
        let mut applied_by_version: BTreeMap<&SchemaVersion, u32> =
            applied.iter().map(|a| (&a.version, a.checksum)).collect();

        let mut pending = Vec::new();
        let mut drifted = Vec::new();
        for migration in migrations {
            match applied_by_version.remove(&migration.version) {
                None => pending.push(migration),
                Some(expected) if expected != migration.checksum => {
                    drifted.push(ChecksumDrift {
                        version: migration.version.clone(),
                        expected,
                        actual: migration.checksum,
                    });
                }
                Some(_) => {}
            }
        }

        let missing = applied_by_version.into_keys().cloned().collect();

        Self {
            pending,
            drifted,
            missing,
        }
    }

    /// Check if there's anything to apply.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if there are blocking issues.
    pub fn has_blocking_issues(&self) -> bool {
        !self.drifted.is_empty()
    }

    /// Get a summary of the plan.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.pending.is_empty() {
            parts.push(format!("{} pending migrations", self.pending.len()));
        }

        if !self.drifted.is_empty() {
            parts.push(format!("{} CHANGED after apply", self.drifted.len()));
        }

        if !self.missing.is_empty() {
            parts.push(format!("{} applied but missing", self.missing.len()));
        }

        if parts.is_empty() {
            "No changes to apply".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Result of applying pending migrations.
#[derive(Debug)]
pub struct ApplyResult {
    /// Versions applied, in order.
    pub applied: Vec<SchemaVersion>,
    /// Total duration in milliseconds.
    pub duration_ms: u128,
}

/// Resolve migrations, diff them against history, and apply what is pending.
///
/// Refuses to run when an applied script has changed, and stops at the
/// first migration the executor fails to apply.
pub async fn apply_pending<S, E>(source: &S, executor: &E) -> ResolveResult<ApplyResult>
where
    S: MigrationSource + ?Sized,
    E: MigrationExecutor + ?Sized,
{
    let start = Instant::now();
    let migrations = source.resolve_migrations()?;
    let applied = executor.applied_migrations().await?;
    let plan = MigrationPlan::build(migrations, &applied);
    info!("Migration plan: {}", plan.summary());

    if plan.has_blocking_issues() {
        let versions: Vec<String> = plan.drifted.iter().map(|d| d.version.to_string()).collect();
        return Err(ResolveError::execution(format!(
            "applied migrations changed since they were applied: {}",
            versions.join(", ")
        )));
    }

    for version in &plan.missing {
        warn!("Applied migration {} is not resolvable anymore", version);
    }

    let mut result = ApplyResult {
        applied: Vec::with_capacity(plan.pending.len()),
        duration_ms: 0,
    };
    for migration in &plan.pending {
        info!(
            "Applying migration {} - {} ({})",
            migration.version, migration.description, migration.origin
        );
        executor.apply(migration).await?;
        result.applied.push(migration.version.clone());
    }

    result.duration_ms = start.elapsed().as_millis();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::ResolverConfig;
    use crate::resolver::SqlMigrationResolver;
    use crate::resource::ResourceTree;

    #[derive(Default)]
    struct MemoryExecutor {
        applied: Mutex<Vec<AppliedMigration>>,
        fail_on: Option<String>,
    }

    #[async_trait::async_trait]
    impl MigrationExecutor for MemoryExecutor {
        async fn applied_migrations(&self) -> ResolveResult<Vec<AppliedMigration>> {
            Ok(self.applied.lock().unwrap().clone())
        }

        async fn apply(&self, migration: &MigrationDescriptor) -> ResolveResult<()> {
            if self.fail_on.as_deref() == Some(migration.version.to_string().as_str()) {
                return Err(ResolveError::execution("syntax error"));
            }
            migration.content.text()?;
            self.applied
                .lock()
                .unwrap()
                .push(AppliedMigration::new(migration.version.clone(), migration.checksum));
            Ok(())
        }
    }

    fn source() -> SqlMigrationResolver {
        SqlMigrationResolver::new(ResolverConfig::new().locations(["resource:sql"])).with_resources(
            ResourceTree::new()
                .with("sql/1.0/1.init.sql", "CREATE TABLE a();")
                .with("sql/1.0/2.more.sql", "CREATE TABLE b();")
                .with("sql/1.1/1.alter.sql", "ALTER TABLE a;"),
        )
    }

    fn v(s: &str) -> SchemaVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_plan_diff() {
        let migrations = source().resolve().unwrap();
        let applied = vec![
            AppliedMigration::new(v("1.0.1"), migrations[0].checksum),
            AppliedMigration::new(v("1.0.2"), 42),
            AppliedMigration::new(v("0.9.1"), 7),
        ];

        let plan = MigrationPlan::build(migrations, &applied);
        assert_eq!(plan.pending.len(), 1);
        assert_eq!(plan.pending[0].version, v("1.1.1"));
        assert_eq!(plan.drifted.len(), 1);
        assert_eq!(plan.drifted[0].version, v("1.0.2"));
        assert_eq!(plan.drifted[0].expected, 42);
        assert_eq!(plan.missing, vec![v("0.9.1")]);
        assert!(plan.has_blocking_issues());
        assert!(plan.summary().contains("1 pending migrations"));
    }

    #[test]
    fn test_empty_plan_summary() {
        let plan = MigrationPlan::build(Vec::new(), &[]);
        assert!(plan.is_empty());
        assert_eq!(plan.summary(), "No changes to apply");
    }

    #[tokio::test]
    async fn test_apply_pending_in_order() {
        let executor = MemoryExecutor::default();
        let result = apply_pending(&source(), &executor).await.unwrap();
        assert_eq!(result.applied, vec![v("1.0.1"), v("1.0.2"), v("1.1.1")]);

        let again = apply_pending(&source(), &executor).await.unwrap();
        assert!(again.applied.is_empty());
    }

    #[tokio::test]
    async fn test_apply_refuses_drift() {
        let executor = MemoryExecutor::default();
        executor
            .applied
            .lock()
            .unwrap()
            .push(AppliedMigration::new(v("1.0.1"), 1));

        let err = apply_pending(&source(), &executor).await.unwrap_err();
        assert!(matches!(err, ResolveError::Execution(ref msg) if msg.contains("1.0.1")));
        assert_eq!(executor.applied.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_stops_at_first_failure() {
        let executor = MemoryExecutor {
            fail_on: Some("1.0.2".to_string()),
            ..Default::default()
        };
        let err = apply_pending(&source(), &executor).await.unwrap_err();
        assert!(matches!(err, ResolveError::Execution(_)));

        let applied = executor.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].version, v("1.0.1"));
    }
}
