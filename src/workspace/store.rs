//! Sandboxed file operations rooted at the workspace directory.

use crate::error::AgentError;
use std::path::{Path, PathBuf};

/// File store for the agent workspace.
///
/// Absolute paths are used verbatim; relative paths resolve under the
/// workspace root. Construction creates the root directory if absent.
pub struct WorkspaceStore {
    root: PathBuf,
}

impl WorkspaceStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AgentError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| AgentError::io(&root, e))?;
        Ok(Self { root })
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path against the workspace root. Absolute paths pass through.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Read a file. Returns `Ok(None)` when the file does not exist; other
    /// failures (permission, encoding) surface as `Io`.
    pub fn read(&self, path: &str) -> Result<Option<String>, AgentError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&full)
            .map(Some)
            .map_err(|e| AgentError::io(full, e))
    }

    /// Write a file, creating parent directories on demand. Returns the
    /// resolved path.
    pub fn write(&self, path: &str, content: &str) -> Result<PathBuf, AgentError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AgentError::io(parent, e))?;
        }
        std::fs::write(&full, content).map_err(|e| AgentError::io(&full, e))?;
        Ok(full)
    }

    /// Overwrite an existing file. Unlike `write`, the target must exist.
    pub fn modify(&self, path: &str, content: &str) -> Result<PathBuf, AgentError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(AgentError::io(
                &full,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        std::fs::write(&full, content).map_err(|e| AgentError::io(&full, e))?;
        Ok(full)
    }

    /// Whether a file or directory exists at the given path.
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    /// List files in a directory, non-recursive, sorted, workspace-relative
    /// where possible. Missing or non-directory paths yield an empty list.
    pub fn list(&self, directory: &str) -> Result<Vec<String>, AgentError> {
        self.list_entries(directory, |ft| ft.is_file())
    }

    /// List subdirectories in a directory, non-recursive, sorted.
    pub fn list_dirs(&self, directory: &str) -> Result<Vec<String>, AgentError> {
        self.list_entries(directory, |ft| ft.is_dir())
    }

    fn list_entries(
        &self,
        directory: &str,
        keep: impl Fn(&std::fs::FileType) -> bool,
    ) -> Result<Vec<String>, AgentError> {
        let full = self.resolve(directory);
        if !full.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&full).map_err(|e| AgentError::io(&full, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry in {}: {}", full.display(), e);
                    continue;
                }
            };
            let file_type = entry.file_type().map_err(|e| AgentError::io(entry.path(), e))?;
            if !keep(&file_type) {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            names.push(relative.to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
