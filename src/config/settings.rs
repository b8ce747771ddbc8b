use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use super::HubConfig;
use crate::logging::LoggingConfig;

/// Все настройки процесса.
///
/// Источники по возрастанию приоритета: значения по умолчанию, файл,
/// переменные окружения вида `TAGHUB_HUB__DEFAULT_WAIT=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hub: HubConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки из необязательного `taghub.{toml,yaml,json}` в
    /// текущем каталоге и окружения.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::with_name("taghub").required(false));
        Self::build(builder)
    }

    /// Загружает настройки из указанного файла (формат по расширению) и
    /// окружения. Отсутствие файла — ошибка.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from(path.as_ref()).required(true));
        Self::build(builder)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>
    ) -> Result<Self, ConfigError> {
        let cfg = builder
            // Переменные окружения с префиксом TAGHUB_, вложенность через "__"
            .add_source(
                Environment::with_prefix("TAGHUB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }
}
