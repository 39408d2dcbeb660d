//! Reads the lines newer than the cutoff out of a container log database.

pub mod scratch;
pub mod timestamp;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};
use sqlx::ConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;

use scratch::ScratchCopy;
use timestamp::{Cutoff, TimestampError, epoch_nanos, parse_created};

/// How long SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(60);

const SELECT_SINCE: &str = "SELECT created, text FROM log WHERE created >= ?;";

/// One log line, ready to be pushed: nanoseconds since the epoch as a
/// decimal string, and the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp_ns: String,
    pub text: String,
}

/// Loki expects each value as a `[timestamp, line]` pair.
impl Serialize for LogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.timestamp_ns, &self.text).serialize(serializer)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    created: String,
    text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to copy {0:?} to a scratch location: {1}")]
    Copy(PathBuf, #[source] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampError),
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    scratch_root: Option<PathBuf>,
}

impl Extractor {
    pub fn new(scratch_root: Option<PathBuf>) -> Self {
        Self { scratch_root }
    }

    /// Returns every line of `db` created at or after `cutoff`, in table order.
    pub async fn extract(&self, db: &Path, cutoff: &Cutoff) -> Result<Vec<LogRecord>, ExtractError> {
        let copy = ScratchCopy::create(db, self.scratch_root.as_deref())
            .map_err(|e| ExtractError::Copy(db.to_path_buf(), e))?;
        log::debug!("Copied {:?} to {:?}", db, copy.path());

        let rows = select_since(copy.path(), cutoff).await?;

        if let Err(e) = copy.close() {
            log::warn!("Failed to remove scratch copy of {:?}: {}", db, e);
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let created = parse_created(&row.created)?;
            // The SQL comparison is textual and lets a few earlier lines
            // through when the fractional parts differ in length.
            if created < cutoff.instant() {
                log::debug!("Dropping line created at {} before the cutoff", row.created);
                continue;
            }
            records.push(LogRecord {
                timestamp_ns: epoch_nanos(created)?.to_string(),
                text: row.text,
            });
        }
        Ok(records)
    }
}

async fn select_since(path: &Path, cutoff: &Cutoff) -> Result<Vec<LogRow>, sqlx::Error> {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .busy_timeout(BUSY_TIMEOUT)
        .connect()
        .await?;

    let rows = sqlx::query_as::<_, LogRow>(SELECT_SINCE)
        .bind(cutoff.query_param())
        .fetch_all(&mut conn)
        .await?;

    sqlx::Connection::close(conn).await?;
    Ok(rows)
}
