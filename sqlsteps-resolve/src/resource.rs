//! Resource scanning primitives.
//!
//! A [`ResourceScanner`] lists the regular files under a root that match a
//! [`NamingRule`]. Two scanners are provided: [`FileSystemScanner`] walks a
//! directory on disk and [`ResourceTree`] serves scripts held in memory, for
//! example SQL embedded into the binary with `include_str!`.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::NamingRule;
use crate::error::{ResolveError, ResolveResult};
use crate::location::ScriptLocation;

/// A single script found by a scanner.
pub trait Resource: fmt::Debug + Send + Sync {
    /// Full location of the resource: the physical path for filesystem
    /// resources, the logical path for resource tree entries.
    fn location(&self) -> &str;

    /// Path on disk, if the resource lives on the filesystem.
    fn physical_path(&self) -> Option<&Path>;

    /// Load the raw bytes of the resource.
    fn load_bytes(&self) -> ResolveResult<Vec<u8>>;
}

/// Lists resources under a root location.
pub trait ResourceScanner: Send + Sync {
    /// List regular files under `location` whose names match `rule`,
    /// sorted by location.
    fn scan(
        &self,
        location: &ScriptLocation,
        rule: &NamingRule,
    ) -> ResolveResult<Vec<Arc<dyn Resource>>>;
}

/// A script stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSystemResource {
    path: PathBuf,
    location: String,
}

impl FileSystemResource {
    /// Create a resource for a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }
}

impl Resource for FileSystemResource {
    fn location(&self) -> &str {
        &self.location
    }

    fn physical_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn load_bytes(&self) -> ResolveResult<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| ResolveError::io(&self.path, e))
    }
}

/// Scanner for filesystem locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemScanner;

impl FileSystemScanner {
    fn walk(&self, dir: &Path, rule: &NamingRule, out: &mut Vec<PathBuf>) -> ResolveResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| ResolveError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ResolveError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| ResolveError::io(&path, e))?;
            let metadata = if file_type.is_symlink() {
                // Follow symlinks so linked script directories are scanned too.
                match std::fs::metadata(&path) {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        warn!("Skipping dangling symlink: {}", path.display());
                        continue;
                    }
                    Err(e) => return Err(ResolveError::io(&path, e)),
                }
            } else {
                entry.metadata().map_err(|e| ResolveError::io(&path, e))?
            };

            if metadata.is_dir() {
                self.walk(&path, rule, out)?;
            } else if metadata.is_file() {
                let matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| rule.matches(name));
                if matches {
                    out.push(path);
                }
            } else {
                warn!("Skipping non-regular file: {}", path.display());
            }
        }
        Ok(())
    }
}

impl ResourceScanner for FileSystemScanner {
    fn scan(
        &self,
        location: &ScriptLocation,
        rule: &NamingRule,
    ) -> ResolveResult<Vec<Arc<dyn Resource>>> {
        let root = Path::new(location.path());
        if !root.is_dir() {
            warn!("Migration location does not exist: {}", location);
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        self.walk(root, rule, &mut paths)?;
        paths.sort();
        debug!("Found {} files under {}", paths.len(), location);

        Ok(paths
            .into_iter()
            .map(|p| Arc::new(FileSystemResource::new(p)) as Arc<dyn Resource>)
            .collect())
    }
}

/// A script held in a [`ResourceTree`].
#[derive(Clone)]
pub struct TreeResource {
    path: String,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for TreeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeResource")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Resource for TreeResource {
    fn location(&self) -> &str {
        &self.path
    }

    fn physical_path(&self) -> Option<&Path> {
        None
    }

    fn load_bytes(&self) -> ResolveResult<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }
}

/// In-memory tree of logical resources keyed by `/`-separated paths.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    entries: BTreeMap<String, TreeResource>,
}

impl ResourceTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, replacing any previous entry at the same path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let path = path.into().trim_start_matches('/').to_string();
        let bytes: Vec<u8> = content.into();
        let resource = TreeResource {
            path: path.clone(),
            bytes: Arc::from(bytes),
        };
        self.entries.insert(path, resource);
    }

    /// Builder-style variant of [`ResourceTree::insert`].
    pub fn with(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Number of resources in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceScanner for ResourceTree {
    fn scan(
        &self,
        location: &ScriptLocation,
        rule: &NamingRule,
    ) -> ResolveResult<Vec<Arc<dyn Resource>>> {
        let root = format!("{}/", location.path());
        let found: Vec<Arc<dyn Resource>> = self
            .entries
            .range(root.clone()..)
            .take_while(|(path, _)| path.starts_with(&root))
            .filter(|(path, _)| {
                let name = path.rsplit('/').next().unwrap_or(path.as_str());
                rule.matches(name)
            })
            .map(|(_, res)| Arc::new(res.clone()) as Arc<dyn Resource>)
            .collect();

        debug!("Found {} resources under {}", found.len(), location);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_rule() -> NamingRule {
        NamingRule::new("", ".sql")
    }

    #[test]
    fn test_tree_scan_filters_by_root_and_suffix() {
        let tree = ResourceTree::new()
            .with("sql/1.0/1.sql", "A")
            .with("sql/1.0/notes.txt", "B")
            .with("sql/2.0/postgresql/1.sql", "C")
            .with("sqlother/1.0/1.sql", "D");

        let found = tree
            .scan(&ScriptLocation::resource("sql"), &sql_rule())
            .unwrap();
        let paths: Vec<_> = found.iter().map(|r| r.location().to_string()).collect();

        assert_eq!(paths, vec!["sql/1.0/1.sql", "sql/2.0/postgresql/1.sql"]);
        assert!(found[0].physical_path().is_none());
        assert_eq!(found[0].load_bytes().unwrap(), b"A");
    }

    #[test]
    fn test_tree_scan_applies_prefix() {
        let tree = ResourceTree::new()
            .with("sql/1.0/V1.init.sql", "A")
            .with("sql/1.0/1.init.sql", "B");

        let found = tree
            .scan(&ScriptLocation::resource("sql"), &NamingRule::new("V", ".sql"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location(), "sql/1.0/V1.init.sql");
    }

    #[test]
    fn test_filesystem_scan_is_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("2.0/postgresql")).unwrap();
        std::fs::create_dir_all(root.join("1.0")).unwrap();
        std::fs::write(root.join("2.0/postgresql/1.sql"), "pg").unwrap();
        std::fs::write(root.join("1.0/2.sql"), "two").unwrap();
        std::fs::write(root.join("1.0/1.sql"), "one").unwrap();
        std::fs::write(root.join("1.0/readme.md"), "skip").unwrap();

        let location = ScriptLocation::filesystem(root.display().to_string());
        let found = FileSystemScanner.scan(&location, &sql_rule()).unwrap();

        let paths: Vec<_> = found
            .iter()
            .map(|r| r.physical_path().unwrap().to_path_buf())
            .collect();
        assert_eq!(
            paths,
            vec![
                root.join("1.0").join("1.sql"),
                root.join("1.0").join("2.sql"),
                root.join("2.0").join("postgresql").join("1.sql"),
            ]
        );
        assert_eq!(found[0].load_bytes().unwrap(), b"one");
    }

    #[test]
    fn test_filesystem_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let location = ScriptLocation::filesystem(dir.path().join("nope").display().to_string());
        let found = FileSystemScanner.scan(&location, &sql_rule()).unwrap();
        assert!(found.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_filesystem_scan_skips_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let version_dir = dir.path().join("5.0.0");
        std::fs::create_dir_all(&version_dir).unwrap();
        std::fs::write(version_dir.join("1.init.sql"), "CREATE TABLE a();").unwrap();
        std::os::unix::fs::symlink(version_dir.join("gone"), version_dir.join("notes.txt"))
            .unwrap();
        std::os::unix::fs::symlink(version_dir.join("gone.sql"), version_dir.join("2.link.sql"))
            .unwrap();

        let location = ScriptLocation::filesystem(dir.path().display().to_string());
        let found = FileSystemScanner.scan(&location, &sql_rule()).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].physical_path().unwrap(),
            version_dir.join("1.init.sql")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_filesystem_scan_follows_symlinked_dir() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        std::fs::write(shared.path().join("1.init.sql"), "").unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("5.0.0")).unwrap();

        let location = ScriptLocation::filesystem(dir.path().display().to_string());
        let found = FileSystemScanner.scan(&location, &sql_rule()).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].physical_path().unwrap(),
            dir.path().join("5.0.0").join("1.init.sql")
        );
    }

    #[test]
    fn test_filesystem_resource_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let resource = FileSystemResource::new(dir.path().join("missing.sql"));
        let err = resource.load_bytes().unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }
}
