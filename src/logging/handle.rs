use tracing_appender::non_blocking::WorkerGuard;

/// Handle для управления lifecycle логирования.
///
/// Держит guard файлового writer'а: при drop буфер сбрасывается на диск.
#[derive(Debug, Default)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    /// Создаёт handle; `file_guard` есть, только если включён файловый вывод.
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    /// Включён ли файловый вывод.
    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Явное завершение: сбрасывает файловый буфер.
    pub fn shutdown(self) {
        tracing::debug!(file_sink = self.has_file_sink(), "Logging shutdown");
        drop(self);
    }
}
