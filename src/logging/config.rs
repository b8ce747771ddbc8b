use std::{env, fmt, fs, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::Directive;

use crate::error::LoggingError;

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Формат вывода событий.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidDirective {
                directive: other.to_string(),
                reason: "expected pretty, compact or json".to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Настройки консольного вывода.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

/// Настройки файлового вывода (ежедневная ротация).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    /// Префикс имени файла; к нему добавляется дата
    pub filename: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filename: "taghub.log".to_string(),
        }
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace, debug, info, warn, error, off
    pub level: String,
    /// Дополнительные директивы `EnvFilter`, например `taghub::hub=trace`
    pub directives: Vec<String>,
    pub format: LogFormat,
    pub log_dir: PathBuf,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::default(),
            log_dir: PathBuf::from("logs"),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Переопределения из окружения: `TAGHUB_LOG_LEVEL`, `TAGHUB_LOG_DIR`,
    /// `TAGHUB_LOG_FORMAT`. Непонятный формат игнорируется.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("TAGHUB_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(dir) = env::var("TAGHUB_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Ok(format) = env::var("TAGHUB_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.format = format;
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        let level = self.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }

        for directive in &self.directives {
            directive
                .parse::<Directive>()
                .map_err(|e| LoggingError::InvalidDirective {
                    directive: directive.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Создаёт каталог логов, если включён файловый вывод.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if self.file.enabled {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Строка для `EnvFilter`: уровень, затем директивы через запятую.
    pub fn build_filter_directive(&self) -> String {
        let mut parts = Vec::with_capacity(self.directives.len() + 1);
        parts.push(self.level.to_ascii_lowercase());
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}
