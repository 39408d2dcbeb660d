//! One discovery, extract, send pass over every container.

use crate::config::ExporterConfig;
use crate::container::{ContainerIdentity, NameResolver, ResolveError};
use crate::discovery::{DiscoveryError, LogDatabase, find_log_databases};
use crate::extract::timestamp::Cutoff;
use crate::extract::{ExtractError, Extractor};
use crate::loki::{LokiClient, PushError, PushOutcome};

/// Why a single container could not be exported. None of these stop the
/// run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Name lookup failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("Push failed: {0}")]
    Push(#[from] PushError),
}

#[derive(Debug)]
pub struct ContainerOutcome {
    pub container_id: String,
    /// `None` when the name lookup itself failed.
    pub container_name: Option<String>,
    pub result: Result<PushOutcome, ExportError>,
}

impl ContainerOutcome {
    pub fn is_failure(&self) -> bool {
        match &self.result {
            Ok(outcome) => outcome.is_failure(),
            Err(_) => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ContainerOutcome>,
}

impl RunSummary {
    pub fn lines(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(PushOutcome::lines)
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn log(&self) {
        let failures = self.failures();
        let message = format!(
            "Exported {} lines from {} containers, {} failed",
            self.lines(),
            self.outcomes.len(),
            failures
        );
        if failures == 0 {
            log::info!("{message}");
            return;
        }
        log::warn!("{message}");
        for outcome in self.outcomes.iter().filter(|o| o.is_failure()) {
            let reason = match &outcome.result {
                Ok(PushOutcome::Rejected { status, body }) => {
                    format!("rejected by Loki with {}: {}", status.as_u16(), body)
                }
                Ok(_) => continue,
                Err(e) => e.to_string(),
            };
            log::warn!(
                "  {} ({}): {}",
                outcome.container_id,
                outcome.container_name.as_deref().unwrap_or("unknown name"),
                reason
            );
        }
    }
}

pub async fn run(
    config: &ExporterConfig,
    cutoff: Cutoff,
    resolver: &dyn NameResolver,
    client: &LokiClient,
) -> Result<RunSummary, DiscoveryError> {
    let databases = find_log_databases(&config.containers_dir)?;

    log::info!("Found {} log.db files:", databases.len());
    for db in &databases {
        log::info!("  {}", db.path().display());
    }
    log::info!(
        "Fetching logs newer than {} for {}",
        cutoff.query_param(),
        client.push_url()
    );

    let extractor = Extractor::new(config.scratch_dir.clone());
    let mut summary = RunSummary::default();
    for db in &databases {
        let outcome = export_container(db, &cutoff, resolver, &extractor, client).await;
        if let Err(e) = &outcome.result {
            log::error!(
                "Skipping container {} ({:?}): {}",
                outcome.container_id,
                db.path(),
                e
            );
        }
        summary.outcomes.push(outcome);
    }
    Ok(summary)
}

async fn export_container(
    db: &LogDatabase,
    cutoff: &Cutoff,
    resolver: &dyn NameResolver,
    extractor: &Extractor,
    client: &LokiClient,
) -> ContainerOutcome {
    let container_id = db.container_id();

    let name = match resolver.container_name(&container_id).await {
        Ok(name) => name,
        Err(e) => {
            return ContainerOutcome {
                container_id,
                container_name: None,
                result: Err(e.into()),
            };
        }
    };
    if name.is_empty() {
        log::warn!(
            "Container {} has no name, sending with an empty service_name",
            container_id
        );
    }

    let identity = ContainerIdentity {
        id: container_id,
        name,
    };
    log::info!("Processing container {} ({})", identity.id, identity.name);

    let result = extract_and_push(db, cutoff, &identity, extractor, client).await;

    ContainerOutcome {
        container_id: identity.id,
        container_name: Some(identity.name),
        result,
    }
}

async fn extract_and_push(
    db: &LogDatabase,
    cutoff: &Cutoff,
    identity: &ContainerIdentity,
    extractor: &Extractor,
    client: &LokiClient,
) -> Result<PushOutcome, ExportError> {
    let records = extractor.extract(db.path(), cutoff).await?;
    log::info!("Extracted {} lines for {}", records.len(), identity.id);
    Ok(client.push(identity, &records).await?)
}
