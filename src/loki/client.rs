use reqwest::StatusCode;
use url::Url;

use super::payload::PushRequest;
use crate::container::ContainerIdentity;
use crate::extract::LogRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Loki accepted the batch.
    Sent { lines: usize },
    /// Nothing newer than the cutoff, no request was made.
    NoNewLogs,
    /// Loki answered with something other than `204 No Content`.
    Rejected { status: StatusCode, body: String },
    /// `--dry-run`: the payload was logged instead of sent.
    DryRun { lines: usize },
}

impl PushOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn lines(&self) -> usize {
        match self {
            Self::Sent { lines } | Self::DryRun { lines } => *lines,
            Self::NoNewLogs | Self::Rejected { .. } => 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Failed to serialize push request: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct LokiClient {
    http: reqwest::Client,
    push_url: Url,
    dry_run: bool,
}

impl LokiClient {
    pub fn new(push_url: Url, dry_run: bool) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            push_url,
            dry_run,
        })
    }

    pub fn push_url(&self) -> &Url {
        &self.push_url
    }

    /// Sends one container's lines as a single stream. A non-204 answer is
    /// reported through the outcome, only transport failures are errors.
    pub async fn push(
        &self,
        identity: &ContainerIdentity,
        records: &[LogRecord],
    ) -> Result<PushOutcome, PushError> {
        if records.is_empty() {
            log::info!("No new logs to send for {}", identity.id);
            return Ok(PushOutcome::NoNewLogs);
        }

        let request = PushRequest::for_container(identity, records);

        if self.dry_run {
            let body = serde_json::to_string(&request)?;
            log::info!("Dry run, not sending to {}: {}", self.push_url, body);
            return Ok(PushOutcome::DryRun {
                lines: records.len(),
            });
        }
        if log::log_enabled!(log::Level::Debug) {
            let body = serde_json::to_string(&request)?;
            log::debug!("Pushing to {}: {}", self.push_url, body);
        }

        let response = self
            .http
            .post(self.push_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            log::info!(
                "Sent {} lines from {} ({}) to Loki",
                records.len(),
                identity.id,
                identity.name
            );
            return Ok(PushOutcome::Sent {
                lines: records.len(),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Unable to read the Loki response body: {e}");
                format!("<unreadable response body: {e}>")
            }
        };
        log::error!(
            "Failed to send logs from {} to Loki: {} - {}",
            identity.id,
            status.as_u16(),
            body
        );
        Ok(PushOutcome::Rejected { status, body })
    }
}
