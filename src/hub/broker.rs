use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::{sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{
    index::Index, Delivery, Event, Handler, HubStats, Payload, PublishOption, StatsSnapshot, SubId,
    SubscribeOption, Subscription,
};
use crate::{config::HubConfig, error::HubResult, IntoTopic, Topic};

/// Способ доставки, выбранный для конкретной публикации.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Последовательно в задаче издателя
    Sync,
    /// Параллельно, издатель ждёт завершения
    Wait,
    /// Параллельно, колбэки завершения из фоновой задачи
    Finish,
    /// Параллельно, без ожидания
    Detached,
}

impl Mode {
    fn of(event: &Event) -> Self {
        if event.is_sync() {
            Self::Sync
        } else if event.is_wait() {
            Self::Wait
        } else if event.has_on_finish() {
            Self::Finish
        } else {
            Self::Detached
        }
    }
}

struct Shared {
    seq: AtomicU64,
    index: RwLock<Index>,
    stats: HubStats,
    config: HubConfig,
}

/// Внутрипроцессный хаб publish/subscribe.
///
/// Подписки хранятся в многоуровневом индексе под одной RW-блокировкой:
/// подписка, отписка и очистка берут её на запись, публикация на чтение
/// на время отбора подписок и запуска обработчиков.
///
/// Клонирование дешёвое: все клоны разделяют одно состояние.
///
/// Обработчики в режиме `sync` выполняются под блокировкой чтения и не
/// должны вызывать `subscribe`, `unsubscribe` или `clear` того же хаба:
/// ожидающая запись заблокирует публикацию навсегда.
#[derive(Clone)]
pub struct Hub {
    shared: Arc<Shared>,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    pub fn with_config(config: HubConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                seq: AtomicU64::new(0),
                index: RwLock::new(Index::with_capacity(config.registry_capacity)),
                stats: HubStats::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.shared.config
    }

    /// Регистрирует обработчик для шаблона `topic`.
    ///
    /// Топик принимается в любом виде, реализующем [`IntoTopic`]; ошибка
    /// разбора возвращается до изменения состояния хаба.
    pub async fn subscribe<T>(
        &self,
        topic: T,
        handler: Handler,
        opts: impl IntoIterator<Item = SubscribeOption>,
    ) -> HubResult<SubId>
    where
        T: IntoTopic,
    {
        let topic = topic.into_topic()?;
        Ok(self.subscribe_topic(topic, handler, opts).await)
    }

    /// Регистрирует обработчик для готового топика.
    ///
    /// Идентификатор выдаётся под блокировкой записи, поэтому порядок
    /// идентификаторов совпадает с порядком регистрации.
    pub async fn subscribe_topic(
        &self,
        topic: Topic,
        handler: Handler,
        opts: impl IntoIterator<Item = SubscribeOption>,
    ) -> SubId {
        let mut index = self.shared.index.write().await;

        let id = SubId::from(self.shared.seq.fetch_add(1, Ordering::Relaxed) + 1);
        let mut sub = Subscription::new(id, topic, handler);
        for opt in opts {
            opt.apply(&mut sub);
        }

        debug!(
            hub = %self.shared.config.name,
            %id,
            topic = %sub.topic(),
            once = sub.is_once(),
            "Subscribed"
        );
        index.insert(Arc::new(sub));
        id
    }

    /// Удаляет подписку. Возвращает `false`, если её уже нет.
    pub async fn unsubscribe(
        &self,
        id: SubId,
    ) -> bool {
        let removed = self.remove(id).await;
        if removed {
            debug!(hub = %self.shared.config.name, %id, "Unsubscribed");
        }
        removed
    }

    /// Удаляет все подписки. Уже запущенные обработчики доработают.
    pub async fn clear(&self) {
        let mut index = self.shared.index.write().await;
        let dropped = index.len();
        index.clear();
        debug!(hub = %self.shared.config.name, dropped, "Cleared all subscriptions");
    }

    /// Количество активных подписок.
    pub async fn len(&self) -> usize {
        self.shared.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(
        &self,
        id: SubId,
    ) -> bool {
        self.shared.index.read().await.contains(id)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Публикует нагрузку под топиком `topic`.
    ///
    /// Режим по умолчанию берётся из [`HubConfig`], опции применяются
    /// поверх него по порядку.
    ///
    /// В отличие от [`Hub::subscribe`] принимается уже разобранный
    /// [`Topic`]: публикация не возвращает ошибок, поэтому разбор токенов
    /// (`Topic::parse`, `Event::parse`) остаётся на стороне издателя, а
    /// один топик можно публиковать многократно без повторного разбора.
    pub async fn publish(
        &self,
        ctx: &CancellationToken,
        topic: Topic,
        payload: Payload,
        opts: impl IntoIterator<Item = PublishOption>,
    ) {
        let event = Event::new(topic)
            .set_payload(payload)
            .set_sync(self.shared.config.default_sync)
            .set_wait(self.shared.config.default_wait);
        self.publish_event(ctx, event, opts).await;
    }

    /// Публикует готовое событие. Опции применяются к копии события.
    ///
    /// - `sync`: обработчики по возрастанию id в текущей задаче, затем
    ///   колбэки завершения;
    /// - `wait`: обработчики параллельно, возврат после всех, затем
    ///   колбэки;
    /// - есть колбэки завершения: обработчики параллельно, колбэки из
    ///   фоновой задачи после всех (сразу, если совпадений нет);
    /// - иначе обработчики запускаются в фоне без ожидания.
    pub async fn publish_event(
        &self,
        ctx: &CancellationToken,
        event: Event,
        opts: impl IntoIterator<Item = PublishOption>,
    ) {
        let event = opts.into_iter().fold(event, |event, opt| opt.apply(event));
        self.shared.stats.record_published();

        match Mode::of(&event) {
            Mode::Sync => self.publish_sync(ctx, event).await,
            Mode::Wait => self.publish_wait(ctx, event).await,
            Mode::Finish => self.publish_finish(ctx, event).await,
            Mode::Detached => self.publish_detached(ctx, event).await,
        }
    }

    async fn publish_sync(
        &self,
        ctx: &CancellationToken,
        event: Event,
    ) {
        let mut expired = Expired::new(self);
        let mut matched = 0usize;

        {
            let index = self.shared.index.read().await;
            for sub in index.matches(event.topic()) {
                matched += 1;
                let outcome = sub.call(ctx, &event).await;
                self.shared.stats.record_delivery(outcome);
                if sub.should_remove() {
                    expired.push(sub.id());
                }
            }
        }

        self.trace_published(Mode::Sync, &event, matched);
        event.finish(ctx);
        expired.flush().await;
    }

    /// Ожидание идёт через задачу-супервизор: если издатель бросит
    /// future, обработчики и колбэки всё равно доработают.
    async fn publish_wait(
        &self,
        ctx: &CancellationToken,
        event: Event,
    ) {
        let supervisor = self.supervise(ctx, event, Mode::Wait).await;
        // Паника в колбэке завершения не доходит до издателя.
        let _ = supervisor.await;
    }

    async fn publish_finish(
        &self,
        ctx: &CancellationToken,
        event: Event,
    ) {
        // Сброс хэндла отсоединяет супервизор.
        drop(self.supervise(ctx, event, Mode::Finish).await);
    }

    async fn publish_detached(
        &self,
        ctx: &CancellationToken,
        event: Event,
    ) {
        let event = Arc::new(event);
        let handles = self.spawn_matches(ctx, &event).await;
        self.trace_published(Mode::Detached, &event, handles.len());
    }

    /// Запускает доставку и фоновую задачу, которая дожидается всех
    /// обработчиков и затем вызывает колбэки завершения.
    async fn supervise(
        &self,
        ctx: &CancellationToken,
        event: Event,
        mode: Mode,
    ) -> JoinHandle<()> {
        let event = Arc::new(event);
        let handles = self.spawn_matches(ctx, &event).await;
        self.trace_published(mode, &event, handles.len());

        let hub = self.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            hub.join_all(handles).await;
            event.finish(&ctx);
        })
    }

    /// Запускает по задаче на каждую подходящую подписку. Блокировка
    /// чтения держится только на время отбора и запуска.
    ///
    /// Задачи не привязаны к издателю: сброс хэндла их не отменяет.
    async fn spawn_matches(
        &self,
        ctx: &CancellationToken,
        event: &Arc<Event>,
    ) -> Vec<JoinHandle<()>> {
        let index = self.shared.index.read().await;

        index
            .matches(event.topic())
            .map(|sub| {
                let hub = self.clone();
                let sub = Arc::clone(sub);
                let ctx = ctx.clone();
                let event = Arc::clone(event);
                tokio::spawn(async move { hub.deliver(&ctx, &sub, &event).await })
            })
            .collect()
    }

    async fn deliver(
        &self,
        ctx: &CancellationToken,
        sub: &Subscription,
        event: &Event,
    ) {
        let outcome = sub.call(ctx, event).await;
        self.shared.stats.record_delivery(outcome);

        if sub.should_remove() && self.remove(sub.id()).await {
            self.shared.stats.record_auto_removed();
        }
    }

    /// Дожидается всех задач доставки. Паника обработчика считается
    /// неудачной доставкой.
    async fn join_all(
        &self,
        handles: Vec<JoinHandle<()>>,
    ) {
        for handle in handles {
            if handle.await.is_err() {
                self.shared.stats.record_delivery(Delivery::Failed);
            }
        }
    }

    async fn remove(
        &self,
        id: SubId,
    ) -> bool {
        self.shared.index.write().await.remove(id).is_some()
    }

    async fn remove_expired(
        &self,
        ids: Vec<SubId>,
    ) {
        for id in ids {
            if self.remove(id).await {
                self.shared.stats.record_auto_removed();
            }
        }
    }

    fn trace_published(
        &self,
        mode: Mode,
        event: &Event,
        matched: usize,
    ) {
        trace!(
            hub = %self.shared.config.name,
            ?mode,
            topic = %event.topic(),
            matched,
            "Published"
        );
    }
}

/// Одноразовые подписки, исчерпанные в режиме `sync`.
///
/// Обычно удаляются через [`Expired::flush`] после колбэков завершения.
/// Если издатель бросил future раньше, удаление уходит в фоновую задачу.
struct Expired {
    hub: Hub,
    ids: Vec<SubId>,
}

impl Expired {
    fn new(hub: &Hub) -> Self {
        Self {
            hub: hub.clone(),
            ids: Vec::new(),
        }
    }

    fn push(
        &mut self,
        id: SubId,
    ) {
        self.ids.push(id);
    }

    async fn flush(mut self) {
        let ids = std::mem::take(&mut self.ids);
        self.hub.remove_expired(ids).await;
    }
}

impl Drop for Expired {
    fn drop(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let ids = std::mem::take(&mut self.ids);
        let hub = self.hub.clone();
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move { hub.remove_expired(ids).await });
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hub {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let len = self.shared.index.try_read().map(|index| index.len()).ok();
        f.debug_struct("Hub")
            .field("name", &self.shared.config.name)
            .field("len", &len)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use tokio::time::{sleep, Duration, Instant};

    use super::*;
    use crate::{
        error::HandlerError,
        hub::{on_finish, once, sync, wait},
    };

    fn t(tokens: &[&str]) -> Topic {
        Topic::parse(tokens).unwrap()
    }

    /// Обработчик, записывающий id подписки в общий журнал.
    fn recorder(
        log: &Arc<Mutex<Vec<u64>>>,
        tag: u64,
    ) -> Handler {
        let log = log.clone();
        Handler::from_fn(move |_, _, _| {
            log.lock().unwrap().push(tag);
            Ok(())
        })
    }

    fn sleeper(
        calls: &Arc<AtomicUsize>,
        dur: Duration,
    ) -> Handler {
        let calls = calls.clone();
        Handler::new(move |_, _, _| {
            let calls = calls.clone();
            async move {
                sleep(dur).await;
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    async fn grid(log: &Arc<Mutex<Vec<u64>>>) -> Hub {
        let hub = Hub::new();
        for (tag, tokens) in [
            (1, ["a=10", "b=20"]),
            (2, ["a=10", "b=21"]),
            (3, ["a=11", "b=20"]),
            (4, ["a=11", "b=21"]),
            (5, ["a=*", "b=21"]),
        ] {
            hub.subscribe(tokens, recorder(log, tag), []).await.unwrap();
        }
        hub
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let hub = Hub::new();
        let a = hub.subscribe("a=1", Handler::from_fn(|_, _, _| Ok(())), []).await.unwrap();
        let b = hub.subscribe("a=2", Handler::from_fn(|_, _, _| Ok(())), []).await.unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert!(hub.contains(a).await);
    }

    #[tokio::test]
    async fn test_subscribe_parse_error() {
        let hub = Hub::new();
        let res = hub.subscribe(["dangling"], Handler::from_fn(|_, _, _| Ok(())), []).await;
        assert!(res.is_err());
        assert!(hub.is_empty().await);
    }

    #[tokio::test]
    async fn test_sync_delivery_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hub = grid(&log).await;
        let ctx = CancellationToken::new();

        hub.publish(&ctx, t(&["a=10", "b=21"]), Payload::none(), [sync(true)]).await;
        assert_eq!(*log.lock().unwrap(), vec![2, 5]);

        log.lock().unwrap().clear();
        hub.publish(&ctx, t(&["a=10", "b=*"]), Payload::none(), [sync(true)]).await;
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 5]);
    }

    /// Тест проверяет, что синхронные обработчики выполняются один за
    /// другим, а `wait` запускает их параллельно.
    #[tokio::test(start_paused = true)]
    async fn test_sync_vs_wait_timing() {
        let hub = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            hub.subscribe("k=v", sleeper(&calls, Duration::from_secs(1)), []).await.unwrap();
        }
        let ctx = CancellationToken::new();

        let start = Instant::now();
        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [sync(true)]).await;
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let start = Instant::now();
        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [wait(true)]).await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_returns_immediately() {
        let hub = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        hub.subscribe("k=v", sleeper(&calls, Duration::from_secs(1)), []).await.unwrap();

        let start = Instant::now();
        hub.publish(&CancellationToken::new(), t(&["k=v"]), Payload::none(), []).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что колбэк завершения срабатывает ровно один раз
    /// во всех режимах, в том числе без совпадений.
    #[tokio::test(start_paused = true)]
    async fn test_on_finish_all_modes() {
        let hub = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        hub.subscribe("k=v", sleeper(&calls, Duration::from_millis(100)), []).await.unwrap();
        let ctx = CancellationToken::new();

        for topic in [t(&["k=v"]), t(&["k=none"])] {
            for mode in [Some(sync(true)), Some(wait(true)), None] {
                let (tx, rx) = tokio::sync::oneshot::channel();
                let tx = Mutex::new(Some(tx));
                let done = on_finish(move |_, event| {
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send(event.topic().to_string());
                    }
                });

                let opts: Vec<_> = mode.into_iter().chain([done]).collect();
                hub.publish(&ctx, topic.clone(), Payload::none(), opts).await;
                assert_eq!(rx.await.unwrap(), topic.to_string());
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// Тест проверяет, что в режиме `wait` колбэк видит всех обработчиков
    /// уже завершёнными.
    #[tokio::test(start_paused = true)]
    async fn test_on_finish_after_handlers() {
        let hub = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            hub.subscribe("k=v", sleeper(&calls, Duration::from_millis(10)), []).await.unwrap();
        }

        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let (calls2, seen2) = (calls.clone(), seen.clone());
        let done = on_finish(move |_, _| seen2.store(calls2.load(Ordering::SeqCst), Ordering::SeqCst));

        hub.publish(&CancellationToken::new(), t(&["k=v"]), Payload::none(), [wait(true), done])
            .await;
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    /// Тест проверяет, что без `wait` колбэк срабатывает один раз и
    /// только после всех медленных обработчиков, а издатель не ждёт.
    #[tokio::test(start_paused = true)]
    async fn test_on_finish_without_wait() {
        let hub = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for ms in [10, 50, 200] {
            hub.subscribe("k=v", sleeper(&calls, Duration::from_millis(ms)), []).await.unwrap();
        }

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let (calls2, fired2, seen2) = (calls.clone(), fired.clone(), seen.clone());
        let done = on_finish(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
            seen2.store(calls2.load(Ordering::SeqCst), Ordering::SeqCst);
        });

        let start = Instant::now();
        hub.publish(&CancellationToken::new(), t(&["k=v"]), Payload::none(), [done]).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    /// Тест проверяет, что обработчики `wait` доработают, даже если
    /// издатель бросил публикацию по таймауту, а одноразовая подписка
    /// удаляется только после настоящей доставки.
    #[tokio::test(start_paused = true)]
    async fn test_wait_survives_dropped_publisher() {
        let hub = Hub::new();
        let regular = Arc::new(AtomicUsize::new(0));
        let single = Arc::new(AtomicUsize::new(0));
        hub.subscribe("k=v", sleeper(&regular, Duration::from_millis(100)), []).await.unwrap();
        let id = hub
            .subscribe("k=v", sleeper(&single, Duration::from_millis(100)), [once(true)])
            .await
            .unwrap();

        let finished = Arc::new(AtomicUsize::new(0));
        let finished2 = finished.clone();
        let done = on_finish(move |_, _| {
            finished2.fetch_add(1, Ordering::SeqCst);
        });

        let ctx = CancellationToken::new();
        let publish = hub.publish(
            &ctx,
            t(&["k=v"]),
            Payload::none(),
            [wait(true), done],
        );
        assert!(tokio::time::timeout(Duration::from_millis(10), publish).await.is_err());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(regular.load(Ordering::SeqCst), 1);
        assert_eq!(single.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!hub.contains(id).await);
        assert_eq!(hub.len().await, 1);
        assert_eq!(hub.stats().auto_removed, 1);
    }

    /// Тест проверяет, что исчерпанная одноразовая подписка удаляется,
    /// даже если синхронная публикация брошена на следующем обработчике.
    #[tokio::test(start_paused = true)]
    async fn test_sync_dropped_publisher_removes_expired() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let id = hub.subscribe("k=v", recorder(&log, 1), [once(true)]).await.unwrap();
        hub.subscribe("k=v", sleeper(&calls, Duration::from_secs(1)), []).await.unwrap();

        let ctx = CancellationToken::new();
        let publish = hub.publish(&ctx, t(&["k=v"]), Payload::none(), [sync(true)]);
        assert!(tokio::time::timeout(Duration::from_millis(100), publish).await.is_err());
        assert_eq!(*log.lock().unwrap(), vec![1]);

        sleep(Duration::from_millis(10)).await;
        assert!(!hub.contains(id).await);
        assert_eq!(hub.stats().auto_removed, 1);
    }

    /// Тест проверяет, что один разобранный топик публикуется повторно.
    #[tokio::test]
    async fn test_publish_reuses_parsed_topic() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe(["type=alert"], recorder(&log, 1), []).await.unwrap();

        let topic: Topic = "type=alert host=db1".parse().unwrap();
        let ctx = CancellationToken::new();
        for _ in 0..3 {
            hub.publish(&ctx, topic.clone(), Payload::none(), [sync(true)]).await;
        }
        assert_eq!(*log.lock().unwrap(), vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn test_once_sync() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = hub.subscribe("k=v", recorder(&log, 1), [once(true)]).await.unwrap();
        let ctx = CancellationToken::new();

        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [sync(true)]).await;
        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [sync(true)]).await;

        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert!(!hub.contains(id).await);
        assert_eq!(hub.stats().auto_removed, 1);
    }

    #[tokio::test]
    async fn test_once_wait() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("k=v", recorder(&log, 1), [once(true)]).await.unwrap();
        hub.subscribe("k=v", recorder(&log, 2), []).await.unwrap();
        let ctx = CancellationToken::new();

        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [wait(true)]).await;
        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [wait(true)]).await;

        let mut got = log.lock().unwrap().clone();
        got.sort_unstable();
        assert_eq!(got, vec![1, 2, 2]);
        assert_eq!(hub.len().await, 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hub = grid(&log).await;

        assert!(hub.unsubscribe(SubId::from(2)).await);
        assert!(!hub.unsubscribe(SubId::from(2)).await);
        assert!(!hub.unsubscribe(SubId::INVALID).await);
        assert_eq!(hub.len().await, 4);

        hub.publish(&CancellationToken::new(), t(&["a=10", "b=21"]), Payload::none(), [sync(true)])
            .await;
        assert_eq!(*log.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_clear() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hub = grid(&log).await;
        hub.clear().await;

        assert!(hub.is_empty().await);
        hub.publish(&CancellationToken::new(), t(&["a=10", "b=21"]), Payload::none(), [sync(true)])
            .await;
        assert!(log.lock().unwrap().is_empty());

        let id = hub.subscribe("a=1", recorder(&log, 9), []).await.unwrap();
        assert_eq!(id.get(), 6);
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_isolated() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("k=v", Handler::from_fn(|_, _, _| Err(HandlerError::failed("boom"))), [])
            .await
            .unwrap();
        hub.subscribe("k=v", recorder(&log, 2), []).await.unwrap();

        hub.publish(&CancellationToken::new(), t(&["k=v"]), Payload::none(), [sync(true)]).await;

        assert_eq!(*log.lock().unwrap(), vec![2]);
        let stats = hub.stats();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_in_wait_mode() {
        let hub = Hub::new();
        hub.subscribe("k=v", Handler::from_fn(|_, _, _| panic!("handler panic")), [])
            .await
            .unwrap();

        hub.publish(&CancellationToken::new(), t(&["k=v"]), Payload::none(), [wait(true)]).await;
        assert_eq!(hub.stats().failed, 1);
    }

    /// Тест проверяет, что значения по умолчанию из конфигурации задают
    /// режим, а опции его перекрывают.
    #[tokio::test(start_paused = true)]
    async fn test_config_default_mode() {
        let hub = Hub::with_config(HubConfig {
            default_wait: true,
            ..HubConfig::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        hub.subscribe("k=v", sleeper(&calls, Duration::from_secs(1)), []).await.unwrap();
        let ctx = CancellationToken::new();

        hub.publish(&ctx, t(&["k=v"]), Payload::none(), []).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        hub.publish(&ctx, t(&["k=v"]), Payload::none(), [wait(false)]).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_event_keeps_original() {
        let hub = Hub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("k=v", recorder(&log, 1), []).await.unwrap();

        let event = Event::parse(["k=v"]).unwrap();
        hub.publish_event(&CancellationToken::new(), event.clone(), [sync(true)]).await;

        assert!(!event.is_sync());
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_debug() {
        let hub = Hub::new();
        let s = format!("{hub:?}");
        assert!(s.contains("taghub"));
        assert!(s.contains("len: Some(0)"));
    }
}
