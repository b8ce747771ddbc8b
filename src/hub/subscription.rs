use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{Event, Handler};
use crate::Topic;

/// Идентификатор подписки. Выдаётся хабом по возрастанию, начиная с 1;
/// значение 0 зарезервировано и никогда не выдаётся.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubId(u64);

impl SubId {
    pub const INVALID: SubId = SubId(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for SubId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Итог одного вызова обработчика.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    Failed,
    /// Одноразовая подписка уже получила своё событие.
    Skipped,
}

/// Запись подписки.
///
/// После вставки в индекс меняется только счётчик вызовов, поэтому
/// конкурентные доставки одной подписке пересекаются лишь на нём.
pub struct Subscription {
    id: SubId,
    topic: Topic,
    handler: Handler,
    calls: AtomicU64,
    once: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubId,
        topic: Topic,
        handler: Handler,
    ) -> Self {
        Self {
            id,
            topic,
            handler,
            calls: AtomicU64::new(0),
            once: false,
        }
    }

    pub fn id(&self) -> SubId {
        self.id
    }

    /// Шаблон, с которым оформлена подписка.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    /// Сколько раз доставка доходила до подписки (включая пропущенные).
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Acquire)
    }

    pub(crate) fn set_once(
        &mut self,
        once: bool,
    ) {
        self.once = once;
    }

    /// Вызывает обработчик.
    ///
    /// Счётчик увеличивается до вызова: одноразовая подписка, у которой
    /// он уже больше 1, пропускается даже при гонке нескольких публикаций.
    pub(crate) async fn call(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Delivery {
        let calls = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
        if self.once && calls > 1 {
            return Delivery::Skipped;
        }

        match self
            .handler
            .call(ctx.clone(), event.topic().clone(), event.payload().clone())
            .await
        {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Failed,
        }
    }

    /// Одноразовая подписка, которую уже пытались вызвать, подлежит
    /// удалению.
    pub(crate) fn should_remove(&self) -> bool {
        self.once && self.calls() >= 1
    }
}

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic.to_string())
            .field("calls", &self.calls())
            .field("once", &self.once)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{error::HandlerError, hub::Payload};

    fn counting_sub(
        id: u64,
        once: bool,
    ) -> (Subscription, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut sub = Subscription::new(
            SubId::from(id),
            Topic::parse(["a=1"]).unwrap(),
            Handler::from_fn(move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        sub.set_once(once);
        (sub, hits)
    }

    #[test]
    fn test_sub_id() {
        assert!(!SubId::INVALID.is_valid());
        assert!(SubId::from(1).is_valid());
        assert_eq!(SubId::from(42).get(), 42);
        assert_eq!(SubId::from(7).to_string(), "7");
        assert!(SubId::from(1) < SubId::from(2));
    }

    #[tokio::test]
    async fn test_call_regular_subscription() {
        let (sub, hits) = counting_sub(1, false);
        let ctx = CancellationToken::new();
        let event = Event::new(Topic::parse(["a=1"]).unwrap());

        assert_eq!(sub.call(&ctx, &event).await, Delivery::Delivered);
        assert_eq!(sub.call(&ctx, &event).await, Delivery::Delivered);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(sub.calls(), 2);
        assert!(!sub.should_remove());
    }

    /// Тест проверяет, что одноразовая подписка вызывается один раз,
    /// а повторные попытки учитываются как пропущенные.
    #[tokio::test]
    async fn test_call_once_subscription() {
        let (sub, hits) = counting_sub(1, true);
        let ctx = CancellationToken::new();
        let event = Event::new(Topic::empty());

        assert!(!sub.should_remove());
        assert_eq!(sub.call(&ctx, &event).await, Delivery::Delivered);
        assert!(sub.should_remove());
        assert_eq!(sub.call(&ctx, &event).await, Delivery::Skipped);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_reports_failure() {
        let sub = Subscription::new(
            SubId::from(3),
            Topic::empty(),
            Handler::from_fn(|_, _, _| Err(HandlerError::failed("boom"))),
        );
        let event = Event::new(Topic::empty()).with_payload(Payload::new(1u8));

        let res = sub.call(&CancellationToken::new(), &event).await;
        assert_eq!(res, Delivery::Failed);
    }
}
