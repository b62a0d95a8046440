//! File-store port addressed by workspace-relative paths.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PortError;

/// Reads, writes, deletes and lists files relative to a workspace root.
///
/// Paths use `/` separators. Abstracting the store lets tests and dry runs
/// work without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads a file, or `None` when it is missing or unreadable.
    fn read(&self, path: &str) -> Option<String>;

    /// Writes `contents`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the target fails [`check_write_target`] or the
    /// write itself fails.
    fn write(&self, path: &str, contents: &str) -> Result<(), PortError>;

    /// Deletes a file. Deleting a missing file is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the workspace or removal fails.
    fn delete(&self, path: &str) -> Result<(), PortError>;

    /// Lists all files not excluded by the store's [`IgnorePolicy`], sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be traversed.
    fn list(&self) -> Result<Vec<String>, PortError>;
}

/// Why a path cannot be written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteTargetError {
    /// The path is empty or whitespace.
    #[error("target path is blank")]
    Blank,
    /// The path names a directory rather than a file.
    #[error("target path {0:?} is a directory")]
    DirectoryShaped(String),
    /// The file name has no extension.
    #[error("target path {0:?} has no file extension")]
    MissingExtension(String),
    /// The path is absolute or climbs out of the workspace.
    #[error("target path {0:?} is outside the workspace")]
    OutsideWorkspace(String),
}

/// Normalizes separators and strips a leading `./`.
#[must_use]
pub fn normalize_relative(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    match path.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => path,
    }
}

/// Whether `path` ends in a separator and so names a directory.
#[must_use]
pub fn is_directory_shaped(path: &str) -> bool {
    let path = path.trim();
    path.ends_with('/') || path.ends_with('\\')
}

/// Whether the final segment of `path` carries a file extension.
#[must_use]
pub fn has_extension(path: &str) -> bool {
    !is_directory_shaped(path) && Path::new(&normalize_relative(path)).extension().is_some()
}

/// Checks that `path` stays inside the workspace.
///
/// # Errors
///
/// Returns [`WriteTargetError::OutsideWorkspace`] for absolute paths and
/// paths containing `..`.
pub fn check_relative(path: &str) -> Result<(), WriteTargetError> {
    let normalized = normalize_relative(path);
    let escapes = Path::new(&normalized).components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if escapes || normalized.starts_with('/') {
        return Err(WriteTargetError::OutsideWorkspace(path.to_string()));
    }
    Ok(())
}

/// Validates a path as a file write target.
///
/// # Errors
///
/// Returns the first [`WriteTargetError`] the path triggers.
pub fn check_write_target(path: &str) -> Result<(), WriteTargetError> {
    if path.trim().is_empty() {
        return Err(WriteTargetError::Blank);
    }
    if is_directory_shaped(path) {
        return Err(WriteTargetError::DirectoryShaped(path.to_string()));
    }
    check_relative(path)?;
    if !has_extension(path) {
        return Err(WriteTargetError::MissingExtension(path.to_string()));
    }
    Ok(())
}

/// Directory names and file extensions excluded from listings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnorePolicy {
    /// Directory names skipped at any depth.
    pub dirs: Vec<String>,
    /// File extensions skipped, with or without the leading dot.
    pub extensions: Vec<String>,
}

impl IgnorePolicy {
    /// Whether a directory with this name is skipped.
    #[must_use]
    pub fn ignores_dir(&self, name: &str) -> bool {
        self.dirs.iter().any(|dir| dir.eq_ignore_ascii_case(name))
    }

    /// Whether the relative file path is excluded.
    #[must_use]
    pub fn ignores(&self, path: &str) -> bool {
        let normalized = normalize_relative(path);
        let mut segments: Vec<&str> = normalized.split('/').collect();
        let Some(file_name) = segments.pop() else {
            return false;
        };
        if segments.iter().any(|segment| self.ignores_dir(segment)) {
            return true;
        }
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|ignored| ignored.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_target_rules() {
        assert_eq!(check_write_target("  "), Err(WriteTargetError::Blank));
        assert_eq!(
            check_write_target("Models/"),
            Err(WriteTargetError::DirectoryShaped("Models/".into()))
        );
        assert_eq!(
            check_write_target("Models/Food"),
            Err(WriteTargetError::MissingExtension("Models/Food".into()))
        );
        assert_eq!(
            check_write_target("../secret.txt"),
            Err(WriteTargetError::OutsideWorkspace("../secret.txt".into()))
        );
        assert_eq!(
            check_write_target("/etc/passwd.txt"),
            Err(WriteTargetError::OutsideWorkspace("/etc/passwd.txt".into()))
        );
        assert!(check_write_target("./Models/Food.cs").is_ok());
        assert!(check_write_target("Views\\Home\\Index.cshtml").is_ok());
    }

    #[test]
    fn extension_detection() {
        assert!(has_extension("a/b.rs"));
        assert!(!has_extension("a/b"));
        assert!(!has_extension("a.d/"));
        assert!(!has_extension(".gitignore"));
    }

    #[test]
    fn ignore_policy_matches_dirs_and_extensions() {
        let policy = IgnorePolicy {
            dirs: vec!["bin".into(), ".git".into()],
            extensions: vec![".dll".into(), "png".into()],
        };
        assert!(policy.ignores("bin/Debug/app.cs"));
        assert!(policy.ignores("src/.git/config"));
        assert!(policy.ignores("lib/native.DLL"));
        assert!(policy.ignores("img/logo.png"));
        assert!(!policy.ignores("src/binary.cs"));
        assert!(!policy.ignores("bin.cs"));
    }
}
