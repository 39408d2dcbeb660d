use std::path::PathBuf;

use chrono::TimeDelta;
use url::Url;

use crate::cli::{Args, NameLookupKind};
use crate::config_file::{ConfigError, ExporterConfigFile};

pub const DEFAULT_LOKI_HOSTNAME: &str = "localhost";
pub const DEFAULT_LOKI_PORT: u16 = 3100;
pub const DEFAULT_CONTAINERS_DIR: &str = "/volume1/@docker/containers";
pub const DEFAULT_TIME_RANGE_MINUTES: u64 = 30;
pub const DEFAULT_DOCKER_BIN: &str = "docker";

const PUSH_PATH: &str = "loki/api/v1/push";

/// How the display name of a container is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    Cli { docker_bin: PathBuf },
    Api,
}

/// Everything a run needs, built once from the command line and the
/// optional config file and then passed down explicitly.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub push_url: Url,
    pub containers_dir: PathBuf,
    pub time_range: TimeDelta,
    pub name_lookup: NameLookup,
    pub scratch_dir: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn push_url(hostname: &str, port: u16) -> Result<Url, ConfigError> {
    let base = Url::parse(&format!("http://{hostname}:{port}/"))?;
    Ok(base.join(PUSH_PATH)?)
}

impl ExporterConfig {
    pub fn try_init(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => ExporterConfigFile::try_init(path)?,
            None => ExporterConfigFile::default(),
        };
        Self::merge(args, file)
    }

    /// Command line values win over the file, the file wins over defaults.
    fn merge(args: Args, file: ExporterConfigFile) -> Result<Self, ConfigError> {
        let hostname = args
            .loki_hostname
            .or(file.loki_hostname)
            .unwrap_or_else(|| DEFAULT_LOKI_HOSTNAME.to_string());
        let port = args.loki_port.or(file.loki_port).unwrap_or(DEFAULT_LOKI_PORT);

        let minutes = args
            .time_range
            .or(file.time_range)
            .unwrap_or(DEFAULT_TIME_RANGE_MINUTES);
        let time_range = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .ok_or(ConfigError::TimeRange(minutes))?;

        let name_lookup = match args.name_lookup.or(file.name_lookup).unwrap_or_default() {
            NameLookupKind::Cli => NameLookup::Cli {
                docker_bin: args
                    .docker_bin
                    .or(file.docker_bin)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCKER_BIN)),
            },
            NameLookupKind::Api => NameLookup::Api,
        };

        Ok(Self {
            push_url: push_url(&hostname, port)?,
            containers_dir: args
                .containers_dir
                .or(file.containers_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTAINERS_DIR)),
            time_range,
            name_lookup,
            scratch_dir: args.scratch_dir.or(file.scratch_dir),
            dry_run: args.dry_run || file.dry_run,
        })
    }
}
