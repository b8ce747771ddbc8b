use tracing_appender::{
    non_blocking,
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::{
    error::LoggingError,
    logging::{config::LoggingConfig, formatter},
};

/// Файловый слой: ежедневная ротация в `log_dir`, запись через
/// неблокирующий воркер. Guard нужно держать до завершения процесса.
pub fn layer<S>(
    config: &LoggingConfig
) -> Result<(Box<dyn LayerTrait<S> + Send + Sync>, WorkerGuard), LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file.filename)
        .build(&config.log_dir)
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    let (writer, guard) = non_blocking(appender);
    let layer = formatter::build_formatter(config.format, &config.console, false, writer);
    Ok((layer, guard))
}
