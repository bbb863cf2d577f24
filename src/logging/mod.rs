pub mod config;
mod filters;
pub mod handle;
pub mod sinks;

pub use config::{LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Инициализация глобального логирования с конфигурацией.
///
/// Повторный вызов в том же процессе возвращает
/// [`LoggingError::AlreadyInitialized`].
pub fn init_logging(config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;
    let env_filter = filters::build_filter(&config)?;

    let mut layers = Vec::new();
    layers.push(sinks::console::layer(&config));

    let file_guard = match &config.file {
        Some(path) => {
            let (file_layer, guard) = sinks::file::layer(path)?;
            layers.push(file_layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
