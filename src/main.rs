//! Нагрузочный драйвер taghub.
//!
//! Регистрирует набор подписок, публикует поток событий в выбранном
//! режиме и печатает итоговую статистику хаба в JSON.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use taghub::{
    on_finish, sync, wait, CancellationToken, Handler, Hub, Payload, PublishOption, Settings,
    Topic,
};
use tokio::sync::Notify;
use tracing::info;

/// Режим публикации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Sync,
    Wait,
    /// Без ожидания; драйвер дожидается доставки по счётчикам
    Async,
    /// С колбэком завершения на каждое событие
    Finish,
}

#[derive(Parser)]
#[command(name = "taghub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Load driver for the taghub publish/subscribe hub", long_about = None)]
struct Cli {
    /// Количество подписок
    #[arg(short, long, default_value_t = 1000, env = "TAGHUB_SUBSCRIBERS")]
    subscribers: usize,
    /// Количество событий
    #[arg(short, long, default_value_t = 10_000, env = "TAGHUB_EVENTS")]
    events: usize,
    /// Количество различных значений атрибута `kind`
    #[arg(short, long, default_value_t = 16)]
    kinds: usize,
    #[arg(short, long, value_enum, default_value_t = Mode::Wait)]
    mode: Mode,
    /// Файл конфигурации (toml/yaml/json)
    #[arg(short, long, env = "TAGHUB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Settings::load().context("failed to load config")?,
    };
    let logging = taghub::init_logging(settings.logging.clone())?;

    let hub = Hub::with_config(settings.hub.clone());
    let kinds = cli.kinds.max(1);

    for i in 0..cli.subscribers {
        // Каждая восьмая подписка принимает любой kind
        let kind = if i % 8 == 7 {
            "*".to_string()
        } else {
            (i % kinds).to_string()
        };
        let topic = Topic::parse([format!("kind={kind}"), format!("shard={}", i % 4)])?;
        hub.subscribe_topic(topic, Handler::from_fn(|_, _, _| Ok(())), [])
            .await;
    }
    info!(subscribers = hub.len().await, mode = ?cli.mode, "Subscriptions registered");

    let ctx = CancellationToken::new();
    let finished = Arc::new(AtomicUsize::new(0));
    let all_finished = Arc::new(Notify::new());
    let start = Instant::now();

    for i in 0..cli.events {
        let topic = Topic::parse([format!("kind={}", i % kinds), format!("shard={}", i % 4)])?;
        let opts: Vec<PublishOption> = match cli.mode {
            Mode::Sync => vec![sync(true)],
            Mode::Wait => vec![wait(true)],
            Mode::Async => vec![sync(false), wait(false)],
            Mode::Finish => {
                let (finished, all_finished) = (finished.clone(), all_finished.clone());
                let total = cli.events;
                vec![
                    sync(false),
                    wait(false),
                    on_finish(move |_, _| {
                        if finished.fetch_add(1, Ordering::AcqRel) + 1 == total {
                            all_finished.notify_one();
                        }
                    }),
                ]
            }
        };
        hub.publish(&ctx, topic, Payload::new(i), opts).await;
    }

    match cli.mode {
        Mode::Finish if cli.events > 0 => all_finished.notified().await,
        Mode::Async => settle(&hub).await,
        _ => {}
    }

    let elapsed = start.elapsed();
    let stats = hub.stats();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        published = stats.published,
        delivered = stats.delivered,
        "Run completed"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    logging.shutdown();
    Ok(())
}

/// Ждёт, пока счётчики доставки перестанут меняться.
async fn settle(hub: &Hub) {
    let mut last = hub.stats();
    loop {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let now = hub.stats();
        if now == last {
            break;
        }
        last = now;
    }
}
