use std::{fmt, sync::Arc};

use tokio_util::sync::CancellationToken;

use super::{Event, FinishCallback, Subscription};

/// Опция подписки. Применяется к записи до вставки в индекс, в порядке
/// передачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubscribeOption {
    /// Доставить не более одного события, затем отписаться.
    Once(bool),
}

/// Опция публикации. Применяется к событию до доставки, в порядке
/// передачи.
#[derive(Clone)]
#[non_exhaustive]
pub enum PublishOption {
    /// Последовательная доставка в задаче издателя.
    Sync(bool),
    /// Ждать завершения всех обработчиков.
    Wait(bool),
    /// Колбэк после завершения всех обработчиков.
    OnFinish(FinishCallback),
}

impl SubscribeOption {
    pub(crate) fn apply(
        self,
        sub: &mut Subscription,
    ) {
        match self {
            Self::Once(v) => sub.set_once(v),
        }
    }
}

impl PublishOption {
    pub(crate) fn apply(
        self,
        event: Event,
    ) -> Event {
        match self {
            Self::Sync(v) => event.set_sync(v),
            Self::Wait(v) => event.set_wait(v),
            Self::OnFinish(cb) => event.push_on_finish(cb),
        }
    }
}

impl fmt::Debug for PublishOption {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Sync(v) => f.debug_tuple("Sync").field(v).finish(),
            Self::Wait(v) => f.debug_tuple("Wait").field(v).finish(),
            Self::OnFinish(_) => f.write_str("OnFinish(..)"),
        }
    }
}

/// Подписка будет удалена после первой доставки.
pub fn once(v: bool) -> SubscribeOption {
    SubscribeOption::Once(v)
}

/// Обработчики выполняются по возрастанию id прямо в задаче издателя.
pub fn sync(v: bool) -> PublishOption {
    PublishOption::Sync(v)
}

/// `publish` вернёт управление только после завершения всех обработчиков.
pub fn wait(v: bool) -> PublishOption {
    PublishOption::Wait(v)
}

/// Колбэк, который выполнится после всех обработчиков этой публикации.
pub fn on_finish<F>(cb: F) -> PublishOption
where
    F: Fn(&CancellationToken, &Event) + Send + Sync + 'static,
{
    PublishOption::OnFinish(Arc::new(cb))
}
