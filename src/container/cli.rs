use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use super::{NameResolver, ResolveError};

/// Resolves names with `docker ps`, the same way an operator would.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl DockerCli {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl NameResolver for DockerCli {
    async fn container_name(&self, id: &str) -> Result<String, ResolveError> {
        let output = Command::new(&self.program)
            .args(["ps", "-a", "--filter"])
            .arg(format!("id={id}"))
            .args(["--format", "{{.Names}}"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResolveError::Spawn(self.program.clone(), e))?;

        if !output.status.success() {
            return Err(ResolveError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
