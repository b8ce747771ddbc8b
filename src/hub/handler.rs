use std::{
    any::{type_name, Any},
    fmt,
    future::Future,
    sync::Arc,
};

use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use super::Payload;
use crate::{
    error::{HandlerError, HandlerResult},
    Topic,
};

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

type HandlerFn = dyn Fn(CancellationToken, Topic, Payload) -> HandlerFuture + Send + Sync;

/// Канонический обработчик подписки: `(ctx, topic, payload) -> Result`.
///
/// Хаб вызывает обработчики только в этой форме. Конструкторы ниже
/// приводят другие формы замыканий к канонической один раз, при
/// подписке, а не при каждой доставке.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Асинхронное замыкание канонической формы.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken, Topic, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_boxed(move |ctx, topic, payload| f(ctx, topic, payload).boxed())
    }

    /// Синхронное замыкание. Выполняется прямо внутри задачи доставки.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CancellationToken, &Topic, &Payload) -> HandlerResult + Send + Sync + 'static,
    {
        Self::from_boxed(move |ctx, topic, payload| future::ready(f(&ctx, &topic, &payload)).boxed())
    }

    /// Обработчик, которому не нужны ни топик, ни нагрузка.
    pub fn unit<F, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_boxed(move |ctx, _topic, _payload| f(ctx).boxed())
    }

    /// Обработчик типизированной нагрузки.
    ///
    /// Нагрузка другого типа (или пустая) не приводится: вызов завершается
    /// ошибкой [`HandlerError::PayloadType`].
    pub fn typed<T, F, Fut>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(CancellationToken, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_boxed(move |ctx, _topic, payload| match payload.downcast::<T>() {
            Some(value) => f(ctx, value).boxed(),
            None => future::ready(Err(HandlerError::PayloadType {
                expected: type_name::<T>(),
            }))
            .boxed(),
        })
    }

    fn from_boxed<F>(f: F) -> Self
    where
        F: Fn(CancellationToken, Topic, Payload) -> HandlerFuture + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(
        &self,
        ctx: CancellationToken,
        topic: Topic,
        payload: Payload,
    ) -> HandlerFuture {
        (self.inner)(ctx, topic, payload)
    }
}

impl fmt::Debug for Handler {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}
