use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::BusConfig;
use crate::{error::SettingsError, logging::LoggingConfig};

/// Настройки приложения: шина и логирование.
///
/// Источники в порядке приоритета (последний побеждает):
/// 1. значения по умолчанию;
/// 2. файл конфигурации (TOML/JSON/YAML, формат по расширению);
/// 3. переменные окружения `PUBSUB_<СЕКЦИЯ>__<ПОЛЕ>`, например
///    `PUBSUB_BUS__DEBUG_MODE=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bus: BusConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "PUBSUB";

    /// Загружает настройки из `path` (если указан) и окружения.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = LoggingConfig::default();
        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("bus.debug_mode", false)?
            .set_default("bus.allow_duplicates", false)?
            .set_default("logging.level", defaults.level)?
            .set_default("logging.with_ansi", defaults.with_ansi)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Переменные окружения с префиксом PUBSUB_ и разделителем секций "__"
        let cfg = builder
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.logging.validate()?;
        Ok(settings)
    }
}
