use std::time::Instant;

use tracing_appender::non_blocking::WorkerGuard;

/// Handle для управления lifecycle логирования.
///
/// Держит guard файлового воркера: пока handle жив, буфер файлового
/// вывода сбрасывается в фоне.
#[derive(Debug)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    /// Включён ли файловый вывод.
    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Сбрасывает файловый буфер и завершает воркер.
    pub fn shutdown(mut self) {
        tracing::info!(file_sink = self.has_file_sink(), "Initiating logging shutdown");

        let start = Instant::now();
        drop(self.file_guard.take());

        tracing::debug!(
            shutdown_duration_ms = start.elapsed().as_millis() as u64,
            "Logging shutdown completed"
        );
    }
}
