use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Extract logs from Docker container log databases and send them to Loki.
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Optional TOML file with the same settings as the flags below.
    /// Flags given on the command line take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Hostname of the Loki server. [default: localhost]
    #[arg(long)]
    pub loki_hostname: Option<String>,
    /// Port of the Loki server. [default: 3100]
    #[arg(long)]
    pub loki_port: Option<u16>,
    /// Directory where Docker containers are stored.
    /// [default: /volume1/@docker/containers]
    #[arg(long)]
    pub containers_dir: Option<PathBuf>,
    /// How many minutes worth of logs to send to Loki. [default: 30]
    #[arg(long, value_parser = parse_minutes)]
    pub time_range: Option<u64>,
    /// How container names are looked up. [default: cli]
    #[arg(long, value_enum)]
    pub name_lookup: Option<NameLookupKind>,
    /// Docker executable used by the `cli` name lookup. [default: docker]
    #[arg(long)]
    pub docker_bin: Option<PathBuf>,
    /// Directory in which scratch copies of the databases are made.
    /// Defaults to the system temp directory.
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
    /// Log the push payloads instead of sending them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameLookupKind {
    /// Run `docker ps` for every container.
    #[default]
    Cli,
    /// Query the Docker Engine API over its local socket.
    Api,
}

/// The time range is accepted as an "integer-like" value, so
/// surrounding whitespace is tolerated.
fn parse_minutes(raw: &str) -> Result<u64, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("invalid number of minutes {raw:?}: {e}"))
}
