//! Hierarchical version assignment.
//!
//! Scripts under the same version directory are ordered by the integer that
//! starts their file name and numbered by rank. With the directory `5.0.0` and
//! scripts `1.init.sql` and `100.migrate_something.sql`, the scripts get the
//! versions `5.0.0.1` and `5.0.0.2`: gaps in the numbering collapse.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::script::{IndexedScript, MigrationScript};
use crate::vendor::ScriptsByVersionDir;
use crate::version::parse_version_dir;

/// Indexed scripts grouped by version directory, ordered by index.
pub type IndexedByVersionDir = BTreeMap<String, Vec<IndexedScript>>;

/// Assigns each effective script its final version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionIndexer {
    separator: char,
    prefix: String,
}

impl Default for VersionIndexer {
    fn default() -> Self {
        Self::new('.', "")
    }
}

impl VersionIndexer {
    /// Create an indexer for the given separator and file name prefix.
    pub fn new(separator: char, prefix: impl Into<String>) -> Self {
        Self {
            separator,
            prefix: prefix.into(),
        }
    }

    /// Index every version directory.
    pub fn index(&self, by_version_dir: ScriptsByVersionDir) -> ResolveResult<IndexedByVersionDir> {
        by_version_dir
            .into_iter()
            .map(|(dir, scripts)| {
                let indexed = self.index_dir(&dir, scripts)?;
                Ok::<_, ResolveError>((dir, indexed))
            })
            .collect()
    }

    fn index_dir(
        &self,
        version_dir: &str,
        scripts: Vec<MigrationScript>,
    ) -> ResolveResult<Vec<IndexedScript>> {
        let dir_version = parse_version_dir(version_dir)?;

        let mut ordered: BTreeMap<u32, MigrationScript> = BTreeMap::new();
        for script in scripts {
            let numeric = self.parse_numeric_index(&script.file_name)?;
            match ordered.entry(numeric) {
                Entry::Vacant(slot) => {
                    slot.insert(script);
                }
                Entry::Occupied(slot) => {
                    return Err(ResolveError::duplicate_version(
                        format!("{} in {}", numeric, version_dir),
                        slot.get().to_string(),
                        script.to_string(),
                    ));
                }
            }
        }

        let indexed: Vec<IndexedScript> = ordered
            .into_iter()
            .zip(1u32..)
            .map(|((numeric_index, script), index)| IndexedScript {
                version: dir_version.child(u64::from(index)),
                script,
                numeric_index,
                index,
            })
            .collect();

        debug!(
            "Indexed {} scripts in {} as {}",
            indexed.len(),
            version_dir,
            dir_version
        );
        Ok(indexed)
    }

    /// Parse the integer before the first separator, ignoring the prefix.
    pub fn parse_numeric_index(&self, file_name: &str) -> ResolveResult<u32> {
        let sep_idx = file_name.find(self.separator).ok_or_else(|| {
            ResolveError::invalid_version(
                file_name,
                format!("name must contain '{}'", self.separator),
            )
        })?;

        let mut raw = &file_name[..sep_idx];
        if raw.is_empty() {
            return Err(ResolveError::invalid_version(
                file_name,
                format!(
                    "name must provide a version like '4{}migration_description.sql'",
                    self.separator
                ),
            ));
        }

        if !self.prefix.is_empty() && file_name.starts_with(&self.prefix) {
            raw = raw.strip_prefix(self.prefix.as_str()).unwrap_or("");
        }

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ResolveError::invalid_version(
                file_name,
                format!("version '{}' must be an integer", raw),
            ));
        }
        raw.parse::<u32>().map_err(|e| {
            ResolveError::invalid_version(file_name, format!("version '{}': {}", raw, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::location::ScriptLocation;
    use crate::resource::{FileSystemResource, Resource};

    fn script(version_dir: &str, name: &str) -> MigrationScript {
        let resource: Arc<dyn Resource> = Arc::new(FileSystemResource::new(name));
        MigrationScript::new(resource, ScriptLocation::filesystem("sql"), version_dir, None, name)
    }

    fn dir(version_dir: &str, names: &[&str]) -> ScriptsByVersionDir {
        let mut map = ScriptsByVersionDir::new();
        map.insert(
            version_dir.to_string(),
            names.iter().map(|n| script(version_dir, n)).collect(),
        );
        map
    }

    #[test]
    fn test_indexes_scripts() {
        let indexed = VersionIndexer::default()
            .index(dir("5.0.0-M1", &["2.sql", "100.sql", "1.sql"]))
            .unwrap();
        let scripts = &indexed["5.0.0-M1"];

        let summary: Vec<_> = scripts
            .iter()
            .map(|s| {
                (
                    s.script.file_name.as_str(),
                    s.numeric_index,
                    s.index,
                    s.version.to_string(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1.sql", 1, 1, "5.0.0.1.1".to_string()),
                ("2.sql", 2, 2, "5.0.0.1.2".to_string()),
                ("100.sql", 100, 3, "5.0.0.1.3".to_string()),
            ]
        );
    }

    #[test]
    fn test_gaps_collapse_to_dense_ranks() {
        let indexed = VersionIndexer::default()
            .index(dir("5.0.0", &["100.migrate_something.sql", "1.init.sql"]))
            .unwrap();
        let versions: Vec<_> = indexed["5.0.0"].iter().map(|s| s.version.to_string()).collect();
        assert_eq!(versions, vec!["5.0.0.1", "5.0.0.2"]);
    }

    #[test]
    fn test_ignores_prefix_while_indexing() {
        let indexed = VersionIndexer::new('.', "version-")
            .index(dir("5.0.0-M1", &["version-1.init.sql"]))
            .unwrap();
        let script = &indexed["5.0.0-M1"][0];
        assert_eq!(script.index, 1);
        assert_eq!(script.version.to_string(), "5.0.0.1.1");
    }

    #[test]
    fn test_custom_separator() {
        let indexer = VersionIndexer::new('_', "V");
        assert_eq!(indexer.parse_numeric_index("V12_add_users.sql").unwrap(), 12);
        assert!(indexer.parse_numeric_index("V12.add_users.sql").is_err());
    }

    #[test]
    fn test_fails_when_two_scripts_provide_the_same_version() {
        let err = VersionIndexer::default()
            .index(dir("5.0.0-M1", &["1.init.sql", "1.sql"]))
            .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateVersion { .. }));
    }

    #[test]
    fn test_fails_when_script_version_is_invalid() {
        for name in ["2016-11-11.init.sql", "one.init.sql", ".init.sql", "init"] {
            let err = VersionIndexer::default()
                .index(dir("5.0.0-M1", &[name]))
                .unwrap_err();
            assert!(
                matches!(err, ResolveError::InvalidVersionFormat { .. }),
                "{name} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_fails_when_version_dir_has_no_digits() {
        let err = VersionIndexer::default()
            .index(dir("latest", &["1.init.sql"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidVersionFormat { ref name, .. } if name == "latest"
        ));
    }
}
