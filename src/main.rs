//! Демонстрация шины pub/sub.
//!
//! Загружает настройки, поднимает логирование и прогоняет на одной теме
//! отложенную и синхронную публикацию, повторную подписку и ошибку
//! подписчика.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use pubsub::{init_logging, Bus, Settings, Subscriber, TokioScheduler};
use tracing::{info, warn};

/// Аргументы командной строки
#[derive(Debug, Parser)]
#[command(name = "pubsub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "In-process pub/sub bus demo", long_about = None)]
struct Args {
    /// Файл конфигурации (TOML/JSON/YAML)
    #[arg(short, long, env = "PUBSUB_CONFIG")]
    config: Option<PathBuf>,
    /// Включить debug-режим (диагностика отклонённых вызовов и сбоев)
    #[arg(long)]
    debug: bool,
    /// Разрешить повторную подписку одного callback'а
    #[arg(long)]
    allow_duplicates: bool,
    /// Тема для публикации
    #[arg(short, long, default_value = "demo")]
    topic: String,
    /// Количество отложенных публикаций
    #[arg(short = 'n', long, default_value_t = 3)]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    settings.bus.debug_mode |= args.debug;
    settings.bus.allow_duplicates |= args.allow_duplicates;

    let _logging = init_logging(settings.logging.clone()).context("failed to init logging")?;

    let scheduler = TokioScheduler::spawn();
    let bus: Bus = Bus::builder(scheduler.clone())
        .config(settings.bus)
        .build();
    info!(version = Bus::<Bytes>::VERSION, config = ?bus.config(), "Bus started");

    let printer = Subscriber::new(|topic: &str, payload: &Bytes| {
        info!(topic, payload = %String::from_utf8_lossy(payload), "Received");
    });
    let strict = Subscriber::fallible(|topic: &str, payload: &Bytes| {
        if payload.is_empty() {
            return Err(format!("empty payload on [{topic}]"));
        }
        Ok(())
    });

    let subscription = bus
        .subscribe(&args.topic, printer.clone())
        .context("subscription rejected")?;
    bus.subscribe(&args.topic, strict);
    if bus.subscribe(&args.topic, printer).is_none() {
        warn!(topic = %args.topic, "Duplicate subscription rejected");
    }

    for i in 0..args.count {
        let payload = Bytes::from(format!("message #{i}"));
        bus.publish(&args.topic, payload);
    }
    scheduler.flush().await;

    // пустая нагрузка: strict-подписчик вернёт ошибку, остальные получат сообщение
    bus.publish_sync(&args.topic, Bytes::new());

    subscription.unsubscribe();
    let delivered = bus.publish_sync(&args.topic, Bytes::from_static(b"after unsubscribe"));

    // диагностика debug-режима тоже идёт через планировщик
    scheduler.flush().await;

    info!(delivered_after_unsubscribe = delivered, stats = ?bus.stats(), "Done");
    Ok(())
}
