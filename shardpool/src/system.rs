//! The pool facade: build a graph and a scheduler from a topology and a
//! config, then run forever.

use std::any::TypeId;
use std::sync::Arc;

use shardpool_api::{ActorId, Topology};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::faults::FaultRecord;
use crate::graph::ActorGraph;
use crate::scheduler::{Epoch, Sharder, ShardingConf};

/// A built, runnable pool.
///
/// Cheap to clone; clones share the same scheduler. Exactly one clone may
/// call [`ShardPool::run`] (which never returns; shutdown is not part of
/// this runtime); the others observe the running pool through the snapshot
/// accessors.
#[derive(Clone)]
pub struct ShardPool {
    sharder: Arc<Sharder>,
}

impl ShardPool {
    pub fn new(topology: Topology, config: PoolConfig) -> Result<Self, PoolError> {
        let graph = Arc::new(ActorGraph::build(&topology)?);
        let sharder = Arc::new(Sharder::new(graph, &config)?);
        Ok(Self { sharder })
    }

    /// Run the pool on the calling thread (it becomes worker 0) plus
    /// `threads_count - 1` spawned workers. Never returns.
    pub fn run(&self) -> ! {
        Arc::clone(&self.sharder).run()
    }

    pub fn threads_count(&self) -> usize {
        self.sharder.threads_count()
    }

    pub fn graph(&self) -> &ActorGraph {
        self.sharder.graph()
    }

    /// Snapshot of the configuration all workers are converging to.
    pub fn sharding(&self) -> ShardingConf {
        self.sharder.active_conf()
    }

    pub fn epoch(&self) -> Epoch {
        self.sharder.epoch()
    }

    /// Dense index of the processor of type `A`, if the topology declares
    /// one.
    pub fn resolve_actor<A: 'static>(&self) -> Option<ActorId> {
        self.sharder.graph().resolve(TypeId::of::<A>())
    }

    /// Faults cataloged by one worker thread, most frequent first.
    pub fn faults(&self, thread: usize) -> Vec<FaultRecord> {
        self.sharder.controller().fault_sink(thread).snapshot()
    }

    /// Total occurrences of a fault text across all worker threads.
    pub fn fault_count(&self, text: &str) -> u64 {
        (0..self.threads_count())
            .filter_map(|thread| {
                self.sharder
                    .controller()
                    .fault_sink(thread)
                    .count_of(text)
            })
            .sum()
    }
}
