//! Runtime configuration and environment loading.
use std::env;
use std::path::PathBuf;

use combat_core::BalanceConfig;

/// Configuration shared by the combat service, dispatcher and worker.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub balance: BalanceConfig,
    pub counter: CounterConfig,
    pub dispatch: DispatchConfig,
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `COMBAT_COUNTER_SHARDS` / `COMBAT_SEQUENCE_NAME`
    /// - `COMBAT_EVENT_BUFFER` / `COMBAT_TASK_BUFFER`
    /// - `COMBAT_EVENT_LOG_DIR`
    /// - `COMBAT_INFECTION_TTL_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(shards) = read_env::<u32>("COMBAT_COUNTER_SHARDS") {
            config.counter.shards = shards.max(1);
        }
        if let Some(name) = read_env::<String>("COMBAT_SEQUENCE_NAME") {
            config.counter.sequence_name = name;
        }

        if let Some(capacity) = read_env::<usize>("COMBAT_EVENT_BUFFER") {
            config.dispatch.event_buffer = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("COMBAT_TASK_BUFFER") {
            config.dispatch.task_buffer = capacity.max(1);
        }
        if let Some(dir) = read_env::<PathBuf>("COMBAT_EVENT_LOG_DIR") {
            config.dispatch.event_log_dir = Some(dir);
        }

        if let Some(ttl) = read_env::<i64>("COMBAT_INFECTION_TTL_SECS") {
            config.balance.infection_ttl_secs = ttl.max(0);
        }

        config
    }
}

#[derive(Clone, Debug)]
pub struct CounterConfig {
    pub shards: u32,
    /// Counter that hands out event sequence ids.
    pub sequence_name: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            shards: 3,
            sequence_name: "events".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Capacity of each event bus topic.
    pub event_buffer: usize,
    /// Capacity of the background task queue.
    pub task_buffer: usize,
    /// Where the durable event log lives; in memory when unset.
    pub event_log_dir: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            event_buffer: 100,
            task_buffer: 256,
            event_log_dir: None,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
