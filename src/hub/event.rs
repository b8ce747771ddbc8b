use std::{fmt, sync::Arc};

use tokio_util::sync::CancellationToken;

use super::Payload;
use crate::{error::ParseError, Topic};

/// Колбэк, вызываемый после завершения всех обработчиков события.
pub type FinishCallback = Arc<dyn Fn(&CancellationToken, &Event) + Send + Sync>;

/// Событие: топик, нагрузка и режим доставки.
///
/// Событие неизменяемо: все методы `with_*` возвращают новую копию,
/// исходное значение не трогается.
#[derive(Clone, Default)]
pub struct Event {
    topic: Topic,
    payload: Payload,
    on_finish: Vec<FinishCallback>,
    wait: bool,
    sync: bool,
}

impl Event {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            ..Self::default()
        }
    }

    /// Событие с топиком из токенов (см. [`Topic::parse`]).
    pub fn parse<I, S>(tokens: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Topic::parse(tokens).map(Self::new)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Издатель ждёт завершения всех обработчиков.
    pub fn is_wait(&self) -> bool {
        self.wait
    }

    /// Обработчики вызываются последовательно в задаче издателя.
    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub fn has_on_finish(&self) -> bool {
        !self.on_finish.is_empty()
    }

    pub fn with_topic(
        &self,
        topic: Topic,
    ) -> Self {
        self.clone().set_topic(topic)
    }

    pub fn with_payload(
        &self,
        payload: Payload,
    ) -> Self {
        self.clone().set_payload(payload)
    }

    pub fn with_wait(
        &self,
        wait: bool,
    ) -> Self {
        self.clone().set_wait(wait)
    }

    pub fn with_sync(
        &self,
        sync: bool,
    ) -> Self {
        self.clone().set_sync(sync)
    }

    /// Добавляет колбэк завершения. Колбэки выполняются в порядке
    /// добавления.
    pub fn with_on_finish<F>(
        &self,
        cb: F,
    ) -> Self
    where
        F: Fn(&CancellationToken, &Event) + Send + Sync + 'static,
    {
        self.clone().push_on_finish(Arc::new(cb))
    }

    // Мутирующие варианты для уже принадлежащего нам значения: ими
    // пользуются опции публикации, чтобы не клонировать событие на
    // каждом шаге.

    pub(crate) fn set_topic(
        mut self,
        topic: Topic,
    ) -> Self {
        self.topic = topic;
        self
    }

    pub(crate) fn set_payload(
        mut self,
        payload: Payload,
    ) -> Self {
        self.payload = payload;
        self
    }

    pub(crate) fn set_wait(
        mut self,
        wait: bool,
    ) -> Self {
        self.wait = wait;
        self
    }

    pub(crate) fn set_sync(
        mut self,
        sync: bool,
    ) -> Self {
        self.sync = sync;
        self
    }

    pub(crate) fn push_on_finish(
        mut self,
        cb: FinishCallback,
    ) -> Self {
        self.on_finish.push(cb);
        self
    }

    /// Выполняет колбэки завершения по порядку.
    pub(crate) fn finish(
        &self,
        ctx: &CancellationToken,
    ) {
        for cb in &self.on_finish {
            cb(ctx, self);
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Event")
            .field("topic", &self.topic.to_string())
            .field("payload", &self.payload)
            .field("on_finish", &self.on_finish.len())
            .field("wait", &self.wait)
            .field("sync", &self.sync)
            .finish()
    }
}
