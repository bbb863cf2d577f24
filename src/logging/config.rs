use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Директива фильтра (`"info"`, `"pubsub=debug,warn"`). `RUST_LOG`
    /// имеет приоритет.
    pub level: String,
    pub format: LogFormat,
    /// Цвета ANSI в консоли
    pub with_ansi: bool,
    /// Файл для дополнительного (неблокирующего) вывода
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Проверяет, что `level` является корректной директивой `EnvFilter`.
    pub fn validate(&self) -> Result<(), LoggingError> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| LoggingError::InvalidDirective {
                directive: self.level.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
        assert!(cfg.with_ansi);
        assert!(cfg.file.is_none());
        assert!(cfg.validate().is_ok());
    }

    /// Тест проверяет, что сложные директивы проходят валидацию, а мусор
    /// отклоняется.
    #[test]
    fn test_validate_directives() {
        let ok = LoggingConfig {
            level: "pubsub=debug,warn".into(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = LoggingConfig {
            level: "this_is_invalid_directive!!".into(),
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(LoggingError::InvalidDirective { directive, .. }) if directive == "this_is_invalid_directive!!"
        ));
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let cfg: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert_eq!(cfg.level, "info");
    }
}
