//! Structured logging for the tile compiler.
//!
//! Console output goes through a human-readable `fmt` layer; debug builds can
//! additionally write JSON lines to a file for inspecting a single compile.
//! The level comes from `RUST_LOG` when set, otherwise from the texturing
//! config's `debug.log_level`.

use std::path::Path;

use tessera_config::TexturingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name of the JSON log written in debug builds.
pub const LOG_FILE: &str = "tessera.log";

const DEFAULT_FILTER: &str = "info";

/// Builds the filter string for the given config.
///
/// An empty `log_level` falls back to `info`.
pub fn filter_string(config: Option<&TexturingConfig>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether to also write the JSON file
/// * `config` - Optional configuration supplying the log level
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&TexturingConfig>) {
    let filter_str = filter_string(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_filter_string_from_config() {
        let mut config = TexturingConfig::default();
        assert_eq!(filter_string(Some(&config)), "info");
        config.debug.log_level = "debug,tessera_tiling=trace".to_string();
        assert_eq!(filter_string(Some(&config)), "debug,tessera_tiling=trace");
        config.debug.log_level.clear();
        assert_eq!(filter_string(Some(&config)), "info");
        assert_eq!(filter_string(None), "info");
    }

    #[test]
    fn test_subsystem_filters_parse() {
        for filter_str in ["info", "debug,tessera_texturing=trace", "warn,tessera_tiling=debug"] {
            assert!(EnvFilter::try_new(filter_str).is_ok(), "failed to parse {filter_str}");
        }
    }

    #[test]
    fn test_log_file_location() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join(LOG_FILE);
        assert_eq!(log_path.file_name().unwrap(), "tessera.log");
    }
}
