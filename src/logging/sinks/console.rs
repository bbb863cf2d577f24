use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use super::BoxedLayer;
use crate::logging::config::{LogFormat, LoggingConfig};

/// Консольный layer (stdout) в формате из конфигурации.
pub fn layer<S>(config: &LoggingConfig) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let base = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(config.with_ansi)
        .with_target(true);

    match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        // JSON всегда без цветов
        LogFormat::Json => base.json().with_ansi(false).boxed(),
    }
}
