//! Platform directory layout for configuration, data, and logs.

use crate::{APP_AUTHOR, APP_NAME, APP_QUALIFIER};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl AppDirs {
    /// Resolve the standard per-user locations for this platform. Logs live
    /// under the data directory.
    pub fn discover() -> Result<Self, DirsError> {
        ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
            .map(|dirs| {
                let data_dir = dirs.data_dir().to_path_buf();
                Self {
                    config_dir: dirs.config_dir().to_path_buf(),
                    log_dir: data_dir.join("logs"),
                    data_dir,
                }
            })
            .ok_or(DirsError::NoHomeDirectory)
    }

    /// A layout with everything under one root directory, for tests and
    /// portable installs.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data_dir = root.join("data");
        Self {
            config_dir: root,
            log_dir: data_dir.join("logs"),
            data_dir,
        }
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("no home directory found; cannot resolve spotkey directories")]
    NoHomeDirectory,
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_layout_nests_logs_under_data() {
        let dirs = AppDirs::rooted_at("/tmp/spotkey-test");
        assert_eq!(dirs.config_dir(), Path::new("/tmp/spotkey-test"));
        assert_eq!(dirs.data_dir(), Path::new("/tmp/spotkey-test/data"));
        assert_eq!(dirs.log_dir(), Path::new("/tmp/spotkey-test/data/logs"));
    }

    #[test]
    fn ensure_exists_creates_the_full_tree() {
        let root = tempfile::tempdir().expect("should create tempdir");
        let dirs = AppDirs::rooted_at(root.path().join("nested"));
        dirs.ensure_exists().expect("should create");
        assert!(dirs.config_dir().is_dir());
        assert!(dirs.log_dir().is_dir());
    }

    #[test]
    fn discover_builds_expected_layout() {
        match AppDirs::discover() {
            Ok(dirs) => {
                assert!(dirs.config_dir().is_absolute());
                assert!(dirs.log_dir().starts_with(dirs.data_dir()));
            }
            // Containers without a home directory cannot resolve project
            // dirs at all.
            Err(DirsError::NoHomeDirectory) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
