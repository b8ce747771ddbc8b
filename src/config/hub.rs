use serde::{Deserialize, Serialize};

/// Параметры экземпляра хаба.
///
/// Значения `default_sync` и `default_wait` задают режим публикации,
/// если в вызове `publish` не переданы опции `sync`/`wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Имя экземпляра, попадает в логи
    pub name: String,
    pub default_sync: bool,
    pub default_wait: bool,
    /// Начальная ёмкость общего списка подписок
    pub registry_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: "taghub".to_string(),
            default_sync: false,
            default_wait: false,
            registry_capacity: 0,
        }
    }
}
