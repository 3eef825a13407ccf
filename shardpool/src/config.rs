use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the fault telemetry store.
#[derive(Debug, Clone)]
pub struct FaultLogConfig {
    /// Keep at most this many distinct fault texts; rarest are trimmed first.
    pub top_size: usize,

    /// Faults not seen for this long are evicted.
    pub keep_for: Duration,

    /// Minimum time between persisted dumps.
    pub dump_interval: Duration,

    /// Directory for per-thread dump files (`faults-<thread>.log`).
    /// `None` disables persistence; faults are still counted in memory.
    pub dir: Option<PathBuf>,
}

impl Default for FaultLogConfig {
    fn default() -> Self {
        Self {
            top_size: 1000,
            keep_for: Duration::from_secs(600),
            dump_interval: Duration::from_secs(1),
            dir: None,
        }
    }
}

/// Configuration for a [`crate::ShardPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on worker threads; defaults to the machine's logical CPU
    /// count. The effective pool size is `min(max_threads, processor count)`.
    pub max_threads: usize,

    /// How often each thread sends its no-update acknowledgment, and how
    /// often thread 0 attempts a rebalance.
    pub reshard_interval: Duration,

    /// Bounded wait on the wake signal when a thread's previous cycle
    /// produced no activity.
    pub idle_wait: Duration,

    /// Fault telemetry settings.
    pub fault_log: FaultLogConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: num_cpus::get(),
            reshard_interval: Duration::from_secs(1),
            idle_wait: Duration::from_millis(1),
            fault_log: FaultLogConfig::default(),
        }
    }
}
