//! Ownership scheduling: double-buffered configurations, epoch-fenced
//! handoff, and the worker loop itself.
//!
//! Every worker compares the epoch's active-buffer bit against its local
//! view once per cycle. On mismatch it releases the ownership guards for
//! its old processor list, flips its view, acquires the guards for its new
//! list, resets those processors' timers and rewires their wake signals.
//! Thread 0 may only overwrite the inactive buffer once every thread has
//! acknowledged the current epoch: the quorum guarantees nobody still
//! reads the buffer about to be replaced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, RwLock};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use shardpool_api::ActorId;

use crate::config::PoolConfig;
use crate::engine::Controller;
use crate::error::ConfigError;
use crate::graph::{ActorCell, ActorGraph};
use crate::scheduler::{Epoch, EpochCell, Rebalancer, ShardingConf};
use crate::timing::IntervalTimer;

/// The scheduler instance: owns the graph, the execution controller, the
/// rebalancer, and the epoch-fenced configuration buffers.
pub struct Sharder {
    graph: Arc<ActorGraph>,
    controller: Controller,
    rebalancer: Rebalancer,
    threads_count: usize,
    reshard_interval: Duration,
    epoch: EpochCell,
    bufs: [RwLock<ShardingConf>; 2],
    running: AtomicBool,
}

/// Worker-loop state that never leaves its thread. The guards are the
/// ownership tokens: holding one is what makes this thread the processor's
/// only driver.
struct ThreadState<'g> {
    thread_num: usize,
    second_active: bool,
    ack_pending: bool,
    was_active: bool,
    owned: Vec<ActorId>,
    guards: Vec<MutexGuard<'g, ActorCell>>,
    reshard_gate: IntervalTimer,
}

impl Sharder {
    pub fn new(graph: Arc<ActorGraph>, config: &PoolConfig) -> Result<Self, ConfigError> {
        let threads_count = config.max_threads.min(graph.actor_count());
        if threads_count == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        let initial = ShardingConf::round_robin(graph.actor_count(), threads_count);
        initial.validate(graph.actor_count(), threads_count)?;

        let controller = Controller::new(Arc::clone(&graph), threads_count, config);
        Ok(Self {
            graph,
            controller,
            rebalancer: Rebalancer::new(),
            threads_count,
            reshard_interval: config.reshard_interval,
            epoch: EpochCell::new(),
            bufs: [RwLock::new(initial), RwLock::new(ShardingConf::default())],
            running: AtomicBool::new(false),
        })
    }

    pub fn threads_count(&self) -> usize {
        self.threads_count
    }

    pub fn graph(&self) -> &ActorGraph {
        &self.graph
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.load()
    }

    /// Snapshot of the configuration all threads are converging to.
    pub fn active_conf(&self) -> ShardingConf {
        let epoch = self.epoch.load();
        self.buf(epoch.second_active)
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn buf(&self, second: bool) -> &RwLock<ShardingConf> {
        &self.bufs[second as usize]
    }

    /// Start workers `1..threads_count` and turn the calling thread into
    /// worker 0. Never returns; the pool runs for the process lifetime.
    pub fn run(self: Arc<Self>) -> ! {
        assert!(
            !self.running.swap(true, Ordering::SeqCst),
            "pool is already running"
        );
        info!(
            threads = self.threads_count,
            processors = self.graph.actor_count(),
            edges = self.graph.edge_count(),
            "starting worker pool"
        );

        for thread_num in 1..self.threads_count {
            let sharder = Arc::clone(&self);
            thread::Builder::new()
                .name(format!("shardpool-worker-{thread_num}"))
                .spawn(move || sharder.thread_action(thread_num))
                .expect("failed to spawn worker thread");
        }
        self.thread_action(0)
    }

    /// The worker loop. Runs forever.
    fn thread_action(&self, thread_num: usize) -> ! {
        let mut state = ThreadState {
            thread_num,
            second_active: false,
            ack_pending: false,
            was_active: false,
            owned: Vec::new(),
            guards: Vec::new(),
            reshard_gate: IntervalTimer::new(self.reshard_interval),
        };
        self.start_configuration(&mut state);
        debug!(thread = thread_num, "worker loop running");

        loop {
            // Adopt a newly published configuration.
            if self.epoch.load().second_active != state.second_active {
                self.switch_configuration(&mut state);
            }

            // Idle backoff: park briefly instead of spinning on empty work.
            if !state.was_active {
                self.controller.idle_wait(thread_num);
            }

            // The cycle body runs inside the fault boundary; a panicking
            // processor forfeits the rest of this cycle only.
            let controller = &self.controller;
            let owned = &state.owned;
            let guards = &mut state.guards;
            state.was_active = controller
                .fault_sink(thread_num)
                .run_guarded(|| controller.process_cycle(owned, guards))
                .unwrap_or(false);

            if state.reshard_gate.is_due() {
                state.reshard_gate.reset();
                self.no_update_promise(&mut state);
                if thread_num == 0 {
                    self.reshard();
                }
            }
        }
    }

    /// Promise not to need another configuration until the next epoch.
    /// At most one acknowledgment per thread per epoch.
    fn no_update_promise(&self, state: &mut ThreadState<'_>) {
        if state.ack_pending && self.epoch.try_ack(state.second_active) {
            state.ack_pending = false;
        }
    }

    fn switch_configuration<'g>(&'g self, state: &mut ThreadState<'g>) {
        debug!(thread = state.thread_num, "adopting new configuration");
        self.finish_configuration(state);
        state.second_active = !state.second_active;
        self.start_configuration(state);
    }

    /// Release ownership of the old processor list.
    fn finish_configuration(&self, state: &mut ThreadState<'_>) {
        state.guards.clear();
        state.owned.clear();
    }

    /// Acquire ownership of this thread's slot in the locally-active
    /// configuration, blocking until previous owners release.
    fn start_configuration<'g>(&'g self, state: &mut ThreadState<'g>) {
        {
            let conf = self
                .buf(state.second_active)
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.owned = conf.slot(state.thread_num).to_vec();
        }
        for &actor in &state.owned {
            state.guards.push(self.graph.lock_actor(actor));
        }
        state.ack_pending = true;
        state.reshard_gate.reset();
        self.controller.on_switch(state.thread_num, &state.owned);
    }

    /// Thread 0 only: once every thread has acknowledged the current epoch,
    /// write a fresh partition into the inactive buffer and flip.
    fn reshard(&self) {
        let seen = self.epoch.load();
        if (seen.acks as usize) < self.threads_count {
            return;
        }

        let (actor_cost, edge_cost) = self.controller.average_costs();
        let next =
            self.rebalancer
                .compute(&self.graph, &actor_cost, &edge_cost, self.threads_count);

        {
            let mut inactive = self
                .buf(!seen.second_active)
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *inactive = next;
        }

        // A lost race means an ack arrived concurrently; the buffer write
        // stays (nobody reads the inactive buffer) and the flip is retried
        // on the next interval.
        if self.epoch.try_flip(seen) {
            debug!("published new sharding configuration");
        }
    }
}
