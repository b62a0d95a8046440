//! Live file-store adapter rooted at a workspace directory.

use std::path::PathBuf;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::ports::filesystem::{check_relative, check_write_target, normalize_relative};
use crate::ports::{FileSystem, IgnorePolicy, PortError};

/// Live file-store backed by real disk I/O under `root`.
pub struct LiveFileSystem {
    root: PathBuf,
    ignore: IgnorePolicy,
}

impl LiveFileSystem {
    /// Creates a store rooted at `root`, listing files not excluded by `ignore`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, ignore: IgnorePolicy) -> Self {
        Self { root: root.into(), ignore }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, PortError> {
        check_relative(path)?;
        Ok(self.root.join(normalize_relative(path)))
    }
}

impl FileSystem for LiveFileSystem {
    fn read(&self, path: &str) -> Option<String> {
        let full = self.resolve(path).ok()?;
        match std::fs::read_to_string(&full) {
            Ok(contents) => Some(contents),
            Err(err) => {
                debug!(path, %err, "read failed");
                None
            }
        }
    }

    fn write(&self, path: &str, contents: &str) -> Result<(), PortError> {
        check_write_target(path)?;
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, contents)?;
        info!(path, bytes = contents.len(), "wrote file");
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), PortError> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(&full) {
            Ok(()) => {
                info!(path, "deleted file");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path, "delete of missing file ignored");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>, PortError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !self.ignore.ignores_dir(&e.file_name().to_string_lossy())
        });
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = normalize_relative(&relative.to_string_lossy());
            if !self.ignore.ignores(&relative) {
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }
}
