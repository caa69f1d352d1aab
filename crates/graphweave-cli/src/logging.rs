//! Subscriber setup for the `gw` binary.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Filter directive for this run.
///
/// `-v` wins over `--log-level`, which wins over the config file.
pub fn directive(verbose: bool, level: Option<LogLevel>, configured: &str) -> String {
    if verbose {
        return "debug".to_string();
    }
    match level {
        Some(level) => LevelFilter::from(level).to_string().to_lowercase(),
        None if configured.trim().is_empty() => "info".to_string(),
        None => configured.trim().to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides everything else.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_beats_everything() {
        assert_eq!(directive(true, Some(LogLevel::Error), "warn"), "debug");
    }

    #[test]
    fn explicit_level_beats_config() {
        assert_eq!(directive(false, Some(LogLevel::Trace), "warn"), "trace");
        assert_eq!(directive(false, Some(LogLevel::Off), "warn"), "off");
    }

    #[test]
    fn config_level_is_the_fallback() {
        assert_eq!(directive(false, None, "graphweave_surrealdb=debug"), "graphweave_surrealdb=debug");
        assert_eq!(directive(false, None, " "), "info");
    }
}
