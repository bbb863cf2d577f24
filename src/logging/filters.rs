use tracing_subscriber::EnvFilter;

use crate::{error::LoggingError, logging::config::LoggingConfig};

/// Собирает фильтр: `RUST_LOG`, если задана, иначе директива из конфига.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    // try_from_default_env() вернёт Err, если RUST_LOG отсутствует или пуста
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => Ok(env_filter),
        Err(_) => {
            EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidDirective {
                directive: config.level.clone(),
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    /// Тест проверяет, что без RUST_LOG используется директива конфига.
    #[test]
    #[serial]
    fn test_build_filter_from_config() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            level: "warn".into(),
            ..Default::default()
        };

        let filter = build_filter(&cfg).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    /// Тест проверяет, что RUST_LOG имеет приоритет даже над некорректной
    /// директивой конфига.
    #[test]
    #[serial]
    fn test_rust_log_wins() {
        env::set_var("RUST_LOG", "debug");
        let cfg = LoggingConfig {
            level: "this_is_invalid_directive!!".into(),
            ..Default::default()
        };

        let filter = build_filter(&cfg);
        env::remove_var("RUST_LOG");
        assert_eq!(filter.unwrap().to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_directive_without_env() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            level: "this_is_invalid_directive!!".into(),
            ..Default::default()
        };

        assert!(matches!(
            build_filter(&cfg),
            Err(LoggingError::InvalidDirective { .. })
        ));
    }
}
