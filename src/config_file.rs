use std::path::{Path, PathBuf};

use crate::cli::NameLookupKind;

/// Settings read from the optional `--config` TOML file. Every key is
/// optional; missing keys fall back to the command line or the defaults.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfigFile {
    pub loki_hostname: Option<String>,
    pub loki_port: Option<u16>,
    pub containers_dir: Option<PathBuf>,
    pub time_range: Option<u64>,
    pub name_lookup: Option<NameLookupKind>,
    pub docker_bin: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid Loki push URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Time range of {0} minutes is too large")]
    TimeRange(u64),
}

impl ExporterConfigFile {
    fn try_init_from_string(val: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(val)?)
    }

    pub fn try_init(path: &Path) -> Result<Self, ConfigError> {
        let config =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::try_init_from_string(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_parsing() {
        let input = r#"
            loki_hostname = "loki.internal"
            loki_port = 3101
            containers_dir = "/var/lib/docker/containers"
            time_range = 15
            name_lookup = "api"
        "#;
        let config = ExporterConfigFile::try_init_from_string(input).expect("Failed to parse");
        assert_eq!(config.loki_hostname.as_deref(), Some("loki.internal"));
        assert_eq!(config.loki_port, Some(3101));
        assert_eq!(
            config.containers_dir.as_deref(),
            Some(Path::new("/var/lib/docker/containers"))
        );
        assert_eq!(config.time_range, Some(15));
        assert_eq!(config.name_lookup, Some(NameLookupKind::Api));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_empty_config_file() {
        let config = ExporterConfigFile::try_init_from_string("").unwrap();
        assert!(config.loki_hostname.is_none());
        assert!(config.time_range.is_none());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let res = ExporterConfigFile::try_init_from_string("loki_url = \"http://x\"");
        assert!(matches!(res, Err(ConfigError::Toml(_))), "{:?}", res);
    }

    #[test]
    fn test_missing_file() {
        let res = ExporterConfigFile::try_init(Path::new("/nonexistent/shipper.toml"));
        assert!(matches!(res, Err(ConfigError::Io(_, _))), "{:?}", res);
    }
}
