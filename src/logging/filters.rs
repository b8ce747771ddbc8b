use tracing_subscriber::EnvFilter;

use crate::logging::config::LoggingConfig;

/// Фильтр событий: `RUST_LOG`, если задан, иначе директива из
/// конфигурации.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return env_filter;
    }

    let directive = config.build_filter_directive();
    match EnvFilter::try_new(&directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid log filter directive '{directive}': {e}; falling back to 'info'");
            EnvFilter::new("info")
        }
    }
}
