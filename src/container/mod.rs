//! Maps a log database back to the container that wrote it.

pub mod cli;
pub mod docker;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use normalize_path::NormalizePath;

pub use cli::DockerCli;
pub use docker::DockerApi;

use crate::config::NameLookup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub id: String,
    /// Empty when the runtime does not know the container.
    pub name: String,
}

/// The container id is the name of the directory holding the database.
/// A directory path is used as given; a file path is replaced by its parent
/// first.
pub fn container_id(path: &Path) -> String {
    let dir = match path.parent() {
        Some(parent) if path.is_file() => parent,
        _ => path,
    };
    dir.normalize()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Unable to run {0:?}: {1}")]
    Spawn(PathBuf, #[source] std::io::Error),
    #[error("{program:?} exited with {status}: {stderr}")]
    Exit {
        program: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),
}

/// Looks up the display name of a container by id.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn container_name(&self, id: &str) -> Result<String, ResolveError>;
}

impl NameLookup {
    pub fn build(&self) -> Result<Box<dyn NameResolver>, ResolveError> {
        let resolver: Box<dyn NameResolver> = match self {
            NameLookup::Cli { docker_bin } => Box::new(DockerCli::new(docker_bin.clone())),
            NameLookup::Api => Box::new(DockerApi::connect()?),
        };
        Ok(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("abc123").join("log.db");
        std::fs::create_dir_all(db.parent().unwrap()).unwrap();
        std::fs::write(&db, b"").unwrap();

        assert_eq!(container_id(&db), "abc123");
    }

    #[test]
    fn test_id_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("def456");
        std::fs::create_dir_all(&container).unwrap();

        assert_eq!(container_id(&container), "def456");
        assert_eq!(container_id(&container.join(".")), "def456");
    }

    #[test]
    fn test_id_from_unnormalized_path() {
        assert_eq!(
            container_id(Path::new("/volume1/containers/abc123/logs/..")),
            "abc123"
        );
        assert_eq!(container_id(Path::new("/volume1/containers/abc123/")), "abc123");
    }
}
