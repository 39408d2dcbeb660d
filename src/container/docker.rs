//! Name lookups through the Docker Engine API using bollard.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{ListContainersOptions, ListContainersOptionsBuilder};

use super::{NameResolver, ResolveError};

pub struct DockerApi {
    docker: Docker,
}

impl DockerApi {
    /// Connects using the default method for the platform
    /// (Unix socket on Linux/macOS, named pipe on Windows).
    pub fn connect() -> Result<Self, ResolveError> {
        Ok(Self {
            docker: Docker::connect_with_local_defaults()?,
        })
    }
}

/// Mirrors `docker ps --format {{.Names}}`: names without their leading
/// slash, comma separated, one line per container.
fn format_names(containers: &[ContainerSummary]) -> String {
    containers
        .iter()
        .map(|container| {
            container
                .names
                .iter()
                .flatten()
                .map(|name| name.trim_start_matches('/'))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl NameResolver for DockerApi {
    async fn container_name(&self, id: &str) -> Result<String, ResolveError> {
        let filters = HashMap::from([("id", vec![id])]);
        let options: ListContainersOptions = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&filters)
            .build();

        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(format_names(&containers).trim().to_string())
    }
}
