//! Per-thread execution: the cycle body each worker runs over the
//! processors it currently owns, plus the telemetry that feeds the
//! rebalancer.

use std::sync::{Arc, MutexGuard};
use std::time::Duration;

use tracing::debug;

use shardpool_api::ActorId;

use crate::config::PoolConfig;
use crate::faults::{FaultLog, FaultSink};
use crate::graph::{ActorCell, ActorGraph, WakeSignal};
use crate::timing::SectionTimer;

/// Shared per-pool execution state: wake signals, timers, and fault sinks,
/// all indexed by thread or by graph element. Owned by the scheduler and
/// used from every worker thread.
pub struct Controller {
    graph: Arc<ActorGraph>,
    wake_signals: Vec<Arc<WakeSignal>>,
    actor_timers: Vec<SectionTimer>,
    edge_timers: Vec<SectionTimer>,
    fault_sinks: Vec<FaultSink>,
    idle_wait: Duration,
}

impl Controller {
    pub fn new(graph: Arc<ActorGraph>, threads_count: usize, config: &PoolConfig) -> Self {
        let wake_signals = (0..threads_count)
            .map(|_| Arc::new(WakeSignal::new()))
            .collect();
        let actor_timers = (0..graph.actor_count()).map(|_| SectionTimer::new()).collect();
        let edge_timers = (0..graph.edge_count()).map(|_| SectionTimer::new()).collect();
        let fault_sinks = (0..threads_count)
            .map(|thread| {
                let mut log = FaultLog::new(&config.fault_log);
                if let Some(dir) = &config.fault_log.dir {
                    log.attach(dir.join(format!("faults-{thread}.log")));
                }
                FaultSink::new(log)
            })
            .collect();

        Self {
            graph,
            wake_signals,
            actor_timers,
            edge_timers,
            fault_sinks,
            idle_wait: config.idle_wait,
        }
    }

    pub fn fault_sink(&self, thread: usize) -> &FaultSink {
        &self.fault_sinks[thread]
    }

    pub fn wake_signal(&self, thread: usize) -> &Arc<WakeSignal> {
        &self.wake_signals[thread]
    }

    pub fn actor_timer(&self, actor: ActorId) -> &SectionTimer {
        &self.actor_timers[actor]
    }

    pub fn edge_timer(&self, edge: usize) -> &SectionTimer {
        &self.edge_timers[edge]
    }

    /// Bounded park when the previous cycle produced no activity. The only
    /// place a worker thread ever suspends.
    pub fn idle_wait(&self, thread: usize) {
        self.wake_signals[thread].wait_timeout(self.idle_wait);
    }

    /// Bookkeeping for a thread that just acquired `owned`: measurements
    /// from the previous placement are discarded and senders targeting
    /// these processors now wake this thread.
    pub fn on_switch(&self, thread: usize, owned: &[ActorId]) {
        for &actor in owned {
            self.actor_timers[actor].reset();
            for &edge in self.graph.incoming_edges(actor) {
                self.edge_timers[edge].reset();
            }
        }
        self.graph.rewire_wake_signals(owned, &self.wake_signals[thread]);
        debug!(thread, processors = owned.len(), "ownership acquired");
    }

    /// One cycle over the owned processors: tick each in list order, then
    /// deliver at most one message per incoming edge. Returns whether the
    /// cycle produced any activity.
    ///
    /// Runs inside the caller's fault boundary: a panicking processor
    /// abandons the remainder of the cycle.
    pub fn process_cycle(
        &self,
        owned: &[ActorId],
        cells: &mut [MutexGuard<'_, ActorCell>],
    ) -> bool {
        let mut active = false;

        for (cell, &actor) in cells.iter_mut().zip(owned) {
            let section = self.actor_timers[actor].start();
            if self.graph.tick_actor(actor, cell) {
                active = true;
            }
            section.finish();
        }

        for (cell, &actor) in cells.iter_mut().zip(owned) {
            for &edge in self.graph.incoming_edges(actor) {
                let section = self.edge_timers[edge].start();
                if self.graph.dispatch_one(edge, cell) {
                    active = true;
                }
                section.finish();
            }
        }

        active
    }

    /// Live average costs, the rebalancer's input.
    pub fn average_costs(&self) -> (Vec<Duration>, Vec<Duration>) {
        (
            self.actor_timers.iter().map(SectionTimer::average).collect(),
            self.edge_timers.iter().map(SectionTimer::average).collect(),
        )
    }
}
