use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;

use config::ExporterConfig;
use config_file::ConfigError;
use extract::timestamp::Cutoff;
use loki::LokiClient;

mod cli;
mod config;
mod config_file;
mod container;
mod discovery;
mod export;
mod extract;
mod loki;
#[cfg(test)]
mod test_support;

// Everything runs one container at a time, a single thread is plenty.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let config = match ExporterConfig::try_init(args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(cutoff) = Cutoff::from_window(Utc::now(), config.time_range) else {
        let minutes = u64::try_from(config.time_range.num_minutes()).unwrap_or(u64::MAX);
        log::error!("Invalid configuration: {}", ConfigError::TimeRange(minutes));
        return ExitCode::FAILURE;
    };

    let resolver = match config.name_lookup.build() {
        Ok(resolver) => resolver,
        Err(e) => {
            log::error!("Unable to set up container name lookups: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match LokiClient::new(config.push_url.clone(), config.dry_run) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Unable to set up the Loki client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match export::run(&config, cutoff, resolver.as_ref(), &client).await {
        Ok(summary) => {
            summary.log();
            // Per-container failures have been logged; they do not change
            // the exit status.
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
