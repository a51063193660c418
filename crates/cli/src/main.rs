//! `skirmish`: local driver for the combat service.
//!
//! Seeds an in-memory world with two clans at war, runs one attack, one spy
//! probe and one infiltration through [`CombatService`], and prints the
//! resulting events as JSON. The notification worker runs alongside and is
//! drained before exit.
//!
//! # Environment
//!
//! - `RUST_LOG`: log filter (default `info`)
//! - `SKIRMISH_LOG_DIR`: also write logs to `<dir>/skirmish.log`
//! - `COMBAT_*`: see [`RuntimeConfig::from_env`]

mod world;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use combat_core::{Commitment, Resolution};
use combat_runtime::{
    ChannelTaskQueue, CombatService, Couriers, EventRepository, FileEventLog,
    InMemoryAccountStore, InMemoryEventRepository, NotificationWorker, RuntimeConfig,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = setup_logging()?;
    let config = RuntimeConfig::from_env();

    let events: Arc<dyn EventRepository> = match &config.dispatch.event_log_dir {
        Some(dir) => {
            let log = FileEventLog::open_or_create(dir, "events.log")
                .with_context(|| format!("opening event log in {}", dir.display()))?;
            tracing::info!("Event log: {}/events.log", dir.display());
            Arc::new(log)
        }
        None => Arc::new(InMemoryEventRepository::new()),
    };

    let accounts = Arc::new(InMemoryAccountStore::new());
    let world = world::seed(&accounts)?;

    let (queue, tasks) = ChannelTaskQueue::channel(config.dispatch.task_buffer);
    let service = CombatService::builder()
        .config(config)
        .accounts(accounts.clone())
        .events(events)
        .queue(Arc::new(queue))
        .trackers(world.trackers.clone())
        .subscriptions(world.subscriptions.clone())
        .wars(world.wars.clone())
        .build()?;

    let worker = NotificationWorker::new(
        tasks,
        Couriers::logging(),
        accounts.clone(),
        service.bus().clone(),
    );
    let worker = tokio::spawn(worker.run());

    let attack = service
        .attack(
            world::RAIDER,
            world::KEEPER,
            vec![Commitment::new(world::WORMS, 20)],
        )
        .await?;
    report("attack", &attack)?;

    let spy = service
        .spy(
            world::SCOUT,
            world::KEEPER,
            vec![Commitment::new(world::PROBES, 5)],
        )
        .await?;
    report("spy", &spy)?;

    let infiltration = service
        .infiltrate(
            world::SCOUT,
            world::KEEPER,
            vec![Commitment::new(world::LEECHES, 4)],
        )
        .await?;
    report("infiltrate", &infiltration)?;

    // Dropping the service closes the queue; the worker then drains and stops.
    drop(service);
    let summary = worker.await.context("notification worker panicked")?;
    tracing::info!(
        "Notifications: {} delivered, {} failed",
        summary.delivered,
        summary.failed
    );

    Ok(())
}

fn report(label: &str, resolution: &Resolution) -> Result<()> {
    tracing::info!(
        "{}: {:?} won, sequence {}",
        label,
        resolution.winner,
        resolution.attacker_event.sequence
    );
    println!("{}", serde_json::to_string_pretty(&resolution.events())?);
    Ok(())
}

/// Setup logging to stderr, plus a log file when `SKIRMISH_LOG_DIR` is set.
fn setup_logging() -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(log_dir) = std::env::var_os("SKIRMISH_LOG_DIR").map(PathBuf::from) else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "skirmish.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/skirmish.log", log_dir.display());
    Ok(Some(guard))
}
