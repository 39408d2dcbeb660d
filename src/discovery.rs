use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;
use walkdir::WalkDir;

use crate::container;

/// Name of the per-container log database written by the Docker daemon.
pub const LOG_DB_FILE_NAME: &str = "log.db";

/// A `log.db` file found under the containers directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDatabase {
    path: PathBuf,
}

impl LogDatabase {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn container_id(&self) -> String {
        container::container_id(&self.path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Containers directory {0:?} does not exist or is not a directory")]
    MissingRoot(PathBuf),
    #[error("No {LOG_DB_FILE_NAME} files found under {0:?}")]
    NoDatabases(PathBuf),
}

/// Recursively collects every `log.db` below `root`, sorted by path.
///
/// Entries that cannot be read are skipped with a warning. Finding nothing
/// at all is an error: the run has nothing to do and the containers
/// directory is most likely wrong.
pub fn find_log_databases(root: &Path) -> Result<Vec<LogDatabase>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }
    let root = std::path::absolute(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .normalize();

    let mut databases = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };
        if entry.file_name() != LOG_DB_FILE_NAME {
            continue;
        }
        // Symlinked directories are never descended into, but a link to a
        // database file is followed.
        let file_type = entry.file_type();
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            databases.push(LogDatabase {
                path: entry.into_path(),
            });
        }
    }

    if databases.is_empty() {
        return Err(DiscoveryError::NoDatabases(root));
    }
    Ok(databases)
}
