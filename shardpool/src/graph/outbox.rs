use std::any::TypeId;

use shardpool_api::{ActorId, BoxedMessage, Outbox, SendError};

use crate::graph::ActorGraph;

/// The send capability handed to a processor for the duration of one
/// `tick`/`receive` call. Routes through the graph's edge registry.
pub(crate) struct GraphOutbox<'a> {
    graph: &'a ActorGraph,
    from: ActorId,
}

impl<'a> GraphOutbox<'a> {
    pub(crate) fn new(graph: &'a ActorGraph, from: ActorId) -> Self {
        Self { graph, from }
    }
}

impl Outbox for GraphOutbox<'_> {
    fn send_boxed(&self, to: TypeId, msg: BoxedMessage) -> Result<(), SendError> {
        self.graph.push_message(self.from, to, msg)
    }

    fn from_actor(&self) -> ActorId {
        self.from
    }
}
