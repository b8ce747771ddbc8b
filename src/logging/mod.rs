//! Логирование на базе `tracing`.
//!
//! - `config`: [`LoggingConfig`] и переопределения из окружения.
//! - `filters` (приватный): сборка `EnvFilter`.
//! - `formatter` (приватный): слои pretty/compact/json.
//! - `sinks`: консольный и файловый приёмники.
//! - `handle`: [`LoggingHandle`], владеющий guard файлового воркера.

pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Инициализация глобального subscriber по конфигурации.
///
/// Повторный вызов в одном процессе вернёт [`LoggingError::Init`].
pub fn init_logging(mut config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.apply_env_overrides();
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console.enabled {
        layers.push(sinks::console::layer(&config));
    }

    let file_guard = if config.file.enabled {
        let (file_layer, guard) = sinks::file::layer(&config)?;
        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = %config.format,
        log_dir = %config.log_dir.display(),
        console_enabled = config.console.enabled,
        file_enabled = config.file.enabled,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
