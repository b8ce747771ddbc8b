//! Конфигурация хаба и процесса.
//!
//! - `hub`: параметры экземпляра [`Hub`](crate::Hub).
//! - `settings`: загрузка всех секций из файла и переменных окружения
//!   с префиксом `TAGHUB_`.

pub mod hub;
pub mod settings;

pub use hub::HubConfig;
pub use settings::Settings;
