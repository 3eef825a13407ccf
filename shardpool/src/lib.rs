//! # Shardpool
//!
//! A runtime for a statically-declared network of message processors
//! connected by typed, directed channels, executed by a fixed pool of
//! worker threads that dynamically repartition processor ownership at
//! runtime based on measured load, without stopping the system.
//!
//! Declare a [`Topology`], build a [`ShardPool`], call [`ShardPool::run`]:
//!
//! ```no_run
//! use shardpool::{logging, Message, MessageProcessor, Outbox, PoolConfig, ShardPool, Topology};
//!
//! #[derive(Debug)]
//! struct Beat;
//! impl Message for Beat {}
//!
//! #[derive(Default)]
//! struct Metronome;
//! impl MessageProcessor for Metronome {
//!     fn tick(&mut self, outbox: &dyn Outbox) -> bool {
//!         outbox.send::<Listener, _>(Beat).is_ok()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Listener;
//! impl MessageProcessor for Listener {}
//!
//! fn main() -> Result<(), shardpool::PoolError> {
//!     logging::init_default();
//!     let topology = Topology::new().edge::<Metronome, Listener, Beat>();
//!     let pool = ShardPool::new(topology, PoolConfig::default())?;
//!     pool.run()
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod faults;
pub mod graph;
pub mod logging;
pub mod ranked_map;
pub mod scheduler;
pub mod system;
pub mod timing;

pub use config::{FaultLogConfig, PoolConfig};
pub use error::{BuildError, ConfigError, PoolError};
pub use faults::{FaultRecord, FaultSink};
pub use graph::{ActorGraph, WakeSignal};
pub use scheduler::{Epoch, Rebalancer, ShardingConf};
pub use system::ShardPool;

// The programming model lives in the interface crate; re-export it so
// applications depend on one crate.
pub use shardpool_api::{
    ActorId, BoxedMessage, EdgeId, Message, MessageProcessor, Origin, Outbox, SendError, Topology,
};
