//! # Shardpool API
//!
//! Programming-model interface layer for a dynamically-sharded
//! message-passing runtime. A program is a static graph of message
//! processors connected by typed, directed edges; the runtime decides
//! which worker thread drives which processor and may revise that
//! assignment at any time based on measured load.
//!
//! This crate defines only the model:
//!
//! - [`MessageProcessor`]: a graph node with `tick` and `receive` behavior
//! - [`Message`]: a value that travels along an edge
//! - [`Outbox`]: the capability to emit messages from inside a processor
//! - [`Topology`]: the declarative edge list a graph is built from
//!
//! The runtime crate consumes a [`Topology`] and owns everything else:
//! scheduling, channels, timing, fault telemetry.

pub mod actor;
pub mod errors;
pub mod message;
pub mod topology;
pub mod types;

pub use actor::{MessageProcessor, Origin, Outbox};
pub use errors::SendError;
pub use message::{BoxedMessage, Message};
pub use topology::{EdgeDecl, MessageDecl, NodeDecl, Topology};
pub use types::{ActorId, EdgeId};
