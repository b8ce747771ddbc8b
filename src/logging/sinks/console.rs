use std::io::{self, Stdout};

use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// Консольный слой с форматом из конфигурации.
pub fn layer<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stdout = io::stdout;
    formatter::build_formatter(
        config.format,
        &config.console,
        config.console.with_ansi,
        writer,
    )
}
