use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const LOG_FILE_PREFIX: &str = "tui-state-snapshots.log";

/// Build the filter string from the configured level and per-module levels.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.to_string();
    let mut modules: Vec<_> = config.module_levels.iter().collect();
    modules.sort();
    for (module, level) in modules {
        filter_str.push_str(&format!(",{}={}", module, level));
    }
    filter_str
}

/// Install a file-backed subscriber for snapshot test runs.
///
/// Test output owns stdout, so events go to a daily rolling file instead.
/// `RUST_LOG` takes precedence over the configured levels. Returns `None` when
/// a global subscriber is already installed (e.g. by another test binary setup).
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let log_dir = config.log_directory.as_deref().unwrap_or("logs");
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(filter_directives(config)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .compact()
        .try_init()
        .ok()
        .map(|_| guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_include_modules_sorted() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            module_levels: HashMap::from([
                ("tui_state_snapshots::internal::runner".to_string(), "debug".to_string()),
                ("tui_state_snapshots::internal::controller".to_string(), "trace".to_string()),
            ]),
            log_directory: None,
        };

        assert_eq!(
            filter_directives(&config),
            "warn,tui_state_snapshots::internal::controller=trace,tui_state_snapshots::internal::runner=debug"
        );
    }
}
