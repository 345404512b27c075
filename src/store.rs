//! File store abstraction
//!
//! The workspace and the execution node are reached through [`FileStore`] so
//! a host can back them with something other than the local disk. The CLI
//! uses [`LocalStore`] for both.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File operations the step pipeline needs from a location
pub trait FileStore: Send + Sync {
    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a new, uniquely named empty file in `dir` and return its path
    fn create_temp_file(&self, dir: &Path, prefix: &str, suffix: &str) -> io::Result<PathBuf>;

    /// Delete a file
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Create `path` and all missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy the bytes of a local file into `dest` on this store
    fn upload(&self, local: &Path, dest: &Path) -> io::Result<u64>;

    /// Remove everything inside `dir` except the entries leading to `keep`
    fn delete_contents(&self, dir: &Path, keep: &[PathBuf]) -> io::Result<()>;
}

/// Store backed by the local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl FileStore for LocalStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_temp_file(&self, dir: &Path, prefix: &str, suffix: &str) -> io::Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn upload(&self, local: &Path, dest: &Path) -> io::Result<u64> {
        std::fs::copy(local, dest)
    }

    fn delete_contents(&self, dir: &Path, keep: &[PathBuf]) -> io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if keep.iter().any(|k| k == &path) {
                continue;
            }
            if entry.file_type()?.is_dir() {
                if keep.iter().any(|k| k.starts_with(&path)) {
                    self.delete_contents(&path, keep)?;
                } else {
                    std::fs::remove_dir_all(&path)?;
                }
            } else {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Run a blocking store operation on tokio's blocking pool
pub async fn blocking<T, F>(store: &Arc<dyn FileStore>, op: F) -> io::Result<T>
where
    F: FnOnce(&dyn FileStore) -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(io::Error::other)?
}

/// Root directory of a build on some store
#[derive(Clone)]
pub struct Workspace {
    root: PathBuf,
    store: Arc<dyn FileStore>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn FileStore>) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    /// Workspace on the local file system
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(LocalStore))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    /// Resolve `relative` against the root; absolute paths are kept as-is
    pub fn child(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Base name of the workspace root, for log lines
    pub fn base_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish()
    }
}
