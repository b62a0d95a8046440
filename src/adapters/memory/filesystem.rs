//! In-memory file-store that records every mutation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::ports::filesystem::{check_relative, check_write_target, normalize_relative};
use crate::ports::{FileSystem, IgnorePolicy, PortError};

/// A mutation applied to a [`MemoryFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    /// A successful write.
    Write {
        /// Normalized path.
        path: String,
        /// Contents written.
        contents: String,
    },
    /// A delete, whether or not the file existed.
    Delete {
        /// Normalized path.
        path: String,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, String>,
    ops: Vec<FsOp>,
    failing_writes: usize,
}

/// File-store held in memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<MemoryState>>,
    ignore: IgnorePolicy,
}

impl MemoryFileSystem {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `files`.
    #[must_use]
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let fs = Self::new();
        fs.lock()
            .files
            .extend(files.into_iter().map(|(p, c)| (normalize_relative(p.as_ref()), c.into())));
        fs
    }

    /// Copies every listed file of `source` into a new store.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` cannot be listed.
    pub fn snapshot(source: &dyn FileSystem) -> Result<Self, PortError> {
        let files = source
            .list()?
            .into_iter()
            .filter_map(|path| source.read(&path).map(|contents| (path, contents)));
        Ok(Self::with_files(files))
    }

    /// Sets the policy applied by [`FileSystem::list`].
    #[must_use]
    pub fn ignoring(mut self, ignore: IgnorePolicy) -> Self {
        self.ignore = ignore;
        self
    }

    /// Makes the next `count` writes fail with an I/O-style error.
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().failing_writes = count;
    }

    /// Mutations applied so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<FsOp> {
        self.lock().ops.clone()
    }

    /// Current file contents keyed by path.
    #[must_use]
    pub fn files(&self) -> BTreeMap<String, String> {
        self.lock().files.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &str) -> Option<String> {
        self.lock().files.get(&normalize_relative(path)).cloned()
    }

    fn write(&self, path: &str, contents: &str) -> Result<(), PortError> {
        check_write_target(path)?;
        let path = normalize_relative(path);
        let mut state = self.lock();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(format!("simulated write failure for {path}").into());
        }
        state.files.insert(path.clone(), contents.to_string());
        state.ops.push(FsOp::Write { path: path.clone(), contents: contents.to_string() });
        info!(path, bytes = contents.len(), "wrote file (memory)");
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), PortError> {
        check_relative(path)?;
        let path = normalize_relative(path);
        let mut state = self.lock();
        state.files.remove(&path);
        state.ops.push(FsOp::Delete { path: path.clone() });
        info!(path, "deleted file (memory)");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, PortError> {
        // BTreeMap keys are already sorted.
        Ok(self.lock().files.keys().filter(|p| !self.ignore.ignores(p)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_and_deletes() {
        let fs = MemoryFileSystem::with_files([("./old.cs", "x")]);
        fs.write("Models\\Food.cs", "class Food {}").unwrap();
        fs.delete("old.cs").unwrap();
        fs.delete("never-existed.cs").unwrap();

        assert_eq!(fs.read("Models/Food.cs").as_deref(), Some("class Food {}"));
        assert!(fs.read("old.cs").is_none());
        assert_eq!(
            fs.ops(),
            vec![
                FsOp::Write { path: "Models/Food.cs".into(), contents: "class Food {}".into() },
                FsOp::Delete { path: "old.cs".into() },
                FsOp::Delete { path: "never-existed.cs".into() },
            ]
        );
    }

    #[test]
    fn rejected_targets_leave_no_trace() {
        let fs = MemoryFileSystem::new();
        assert!(fs.write("Models/", "x").is_err());
        assert!(fs.write("Models/Food", "x").is_err());
        assert!(fs.ops().is_empty());
    }

    #[test]
    fn simulated_failures_are_consumed() {
        let fs = MemoryFileSystem::new();
        fs.fail_next_writes(1);
        assert!(fs.write("a.cs", "1").is_err());
        fs.write("a.cs", "2").unwrap();
        assert_eq!(fs.ops().len(), 1);
    }

    #[test]
    fn clones_share_state_and_list_is_filtered() {
        let fs = MemoryFileSystem::with_files([("b.cs", ""), ("bin/x.cs", ""), ("a.cs", "")])
            .ignoring(IgnorePolicy { dirs: vec!["bin".into()], extensions: vec![] });
        let handle = fs.clone();
        fs.write("c.cs", "").unwrap();
        assert_eq!(handle.list().unwrap(), vec!["a.cs", "b.cs", "c.cs"]);
    }

    #[test]
    fn snapshot_copies_listed_files() {
        let source = MemoryFileSystem::with_files([("a.cs", "A"), ("b.cs", "B")]);
        let copy = MemoryFileSystem::snapshot(&source).unwrap();
        copy.write("a.cs", "changed").unwrap();
        assert_eq!(source.read("a.cs").as_deref(), Some("A"));
        assert_eq!(copy.files().len(), 2);
    }
}
