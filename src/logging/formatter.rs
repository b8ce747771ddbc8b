use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::Layer as LayerTrait,
    registry::LookupSpan,
};

use crate::logging::config::{ConsoleConfig, LogFormat};

/// Слой форматирования для заданного формата и приёмника.
///
/// Возвращаем boxed trait-объект, чтобы стереть конкретный тип формата
/// (json/pretty/compact).
pub fn build_formatter<S, W>(
    format: LogFormat,
    opts: &ConsoleConfig,
    with_ansi: bool,
    writer: W,
) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(with_ansi)
        .with_target(opts.with_target)
        .with_thread_ids(opts.with_thread_ids)
        .with_line_number(opts.with_line_numbers);

    match format {
        LogFormat::Json => Box::new(base.json().with_current_span(true)),
        LogFormat::Pretty => Box::new(base.pretty().with_span_events(FmtSpan::CLOSE)),
        LogFormat::Compact => Box::new(base.compact()),
    }
}
