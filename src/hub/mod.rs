//! Подсистема publish/subscribe с маршрутизацией по атрибутам.
//!
//! - `broker`: [`Hub`], регистрация подписок и доставка событий.
//! - `event`: событие с режимом доставки и колбэками завершения.
//! - `handler`: каноническая форма обработчика и адаптеры замыканий.
//! - `index` (приватный): многоуровневый индекс подписок.
//! - `options`: опции подписки и публикации.
//! - `payload`: нагрузка произвольного типа.
//! - `stats`: счётчики доставки.
//! - `subscription`: запись подписки и её идентификатор.
//! - `sublist` (приватный): отсортированные списки подписок и их слияние.

pub mod broker;
pub mod event;
pub mod handler;
mod index;
pub mod options;
pub mod payload;
pub mod stats;
mod sublist;
pub mod subscription;

pub use broker::Hub;
pub use event::{Event, FinishCallback};
pub use handler::{Handler, HandlerFuture};
pub use options::{on_finish, once, sync, wait, PublishOption, SubscribeOption};
pub use payload::Payload;
pub use stats::{HubStats, StatsSnapshot};
pub(crate) use subscription::Delivery;
pub use subscription::{SubId, Subscription};
