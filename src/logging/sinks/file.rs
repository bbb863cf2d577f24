use std::{fs, io, path::Path};

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use super::BoxedLayer;
use crate::error::LoggingError;

/// Файловый layer с неблокирующей записью.
///
/// Каталог файла создаётся при необходимости. Возвращённый `WorkerGuard`
/// нужно держать живым до завершения работы, иначе хвост логов потеряется.
pub fn layer<S>(path: &Path) -> Result<(BoxedLayer<S>, WorkerGuard), LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file path '{}' has no file name", path.display()),
        )
    })?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let (writer, guard) = non_blocking(rolling::never(dir, file_name));
    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .boxed();

    Ok((layer, guard))
}
