use std::any::Any;

pub use pubsub_error::{BusError, ErrorExt, FaultKind, Operation, StatusCode};
use thiserror::Error;

/// Ошибка загрузки настроек.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid logging settings: {0}")]
    Logging(#[from] LoggingError),
}

/// Ошибка инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::InvalidConfig,
            Self::Logging(err) => err.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for LoggingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidDirective { .. } => StatusCode::InvalidConfig,
            Self::AlreadyInitialized => StatusCode::Unexpected,
            Self::Io(_) => StatusCode::Io,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
