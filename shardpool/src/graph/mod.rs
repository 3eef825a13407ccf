//! The static processor graph: nodes, typed directed edges, their queues,
//! and the send registry.
//!
//! Built once from a [`Topology`] and never structurally mutated. The only
//! runtime-mutable piece is each edge's wake-signal pointer, rewired on
//! every ownership change so senders wake whichever thread currently drives
//! the destination processor.

mod outbox;
mod wake;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_queue::SegQueue;
use tracing::debug;

use shardpool_api::{ActorId, BoxedMessage, EdgeId, MessageProcessor, Origin, Topology};

use crate::error::BuildError;

use outbox::GraphOutbox;

pub use wake::WakeSignal;

/// A processor instance as owned by the graph. The surrounding mutex is the
/// ownership token: the driving thread holds the guard for its whole
/// ownership span, which is also what makes `&mut` access sound.
pub type ActorCell = Box<dyn MessageProcessor>;

struct ActorSlot {
    type_id: TypeId,
    name: &'static str,
    cell: Mutex<ActorCell>,
    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

struct EdgeSlot {
    from: ActorId,
    to: ActorId,
    name: String,
    queue: SegQueue<BoxedMessage>,
    wake: Mutex<Option<Arc<WakeSignal>>>,
}

/// The built graph.
pub struct ActorGraph {
    actors: Vec<ActorSlot>,
    edges: Vec<EdgeSlot>,
    by_type: HashMap<TypeId, ActorId>,
    /// (sender, destination type, message type) -> edge.
    routes: HashMap<(ActorId, TypeId, TypeId), EdgeId>,
    /// (from, to) -> edges directly connecting the ordered pair.
    connecting: HashMap<(ActorId, ActorId), Vec<EdgeId>>,
}

const NO_EDGES: &[EdgeId] = &[];

impl ActorGraph {
    /// Build the graph from a static edge list. Processor types referenced
    /// by several edges become a single node; each node is instantiated
    /// exactly once.
    pub fn build(topology: &Topology) -> Result<Self, BuildError> {
        if topology.is_empty() {
            return Err(BuildError::EmptyTopology);
        }

        let mut graph = Self {
            actors: Vec::new(),
            edges: Vec::new(),
            by_type: HashMap::new(),
            routes: HashMap::new(),
            connecting: HashMap::new(),
        };

        for decl in topology.edges() {
            let from = graph.intern_actor(&decl.from);
            let to = graph.intern_actor(&decl.to);
            let edge = graph.edges.len();
            let name = format!(
                "{} -> {} [{}]",
                decl.from.name(),
                decl.to.name(),
                decl.message.name()
            );

            let route = (from, decl.to.type_id(), decl.message.type_id());
            if graph.routes.insert(route, edge).is_some() {
                return Err(BuildError::DuplicateEdge(name));
            }

            graph.actors[from].outgoing.push(edge);
            graph.actors[to].incoming.push(edge);
            graph.connecting.entry((from, to)).or_default().push(edge);
            graph.edges.push(EdgeSlot {
                from,
                to,
                name,
                queue: SegQueue::new(),
                wake: Mutex::new(None),
            });
        }

        graph.log_topology();
        Ok(graph)
    }

    fn intern_actor(&mut self, node: &shardpool_api::NodeDecl) -> ActorId {
        if let Some(&id) = self.by_type.get(&node.type_id()) {
            return id;
        }
        let id = self.actors.len();
        self.by_type.insert(node.type_id(), id);
        self.actors.push(ActorSlot {
            type_id: node.type_id(),
            name: node.name(),
            cell: Mutex::new(node.instantiate()),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        });
        id
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn actor_name(&self, actor: ActorId) -> &'static str {
        self.actors[actor].name
    }

    pub fn edge_name(&self, edge: EdgeId) -> &str {
        &self.edges[edge].name
    }

    pub fn edge_endpoints(&self, edge: EdgeId) -> (ActorId, ActorId) {
        let slot = &self.edges[edge];
        (slot.from, slot.to)
    }

    pub fn incoming_edges(&self, actor: ActorId) -> &[EdgeId] {
        &self.actors[actor].incoming
    }

    pub fn outgoing_edges(&self, actor: ActorId) -> &[EdgeId] {
        &self.actors[actor].outgoing
    }

    /// Edges going directly from `from` to `to`.
    pub fn connecting_edges(&self, from: ActorId, to: ActorId) -> &[EdgeId] {
        self.connecting
            .get(&(from, to))
            .map(Vec::as_slice)
            .unwrap_or(NO_EDGES)
    }

    /// Dense index of the processor of the given type, if declared.
    pub fn resolve(&self, type_id: TypeId) -> Option<ActorId> {
        self.by_type.get(&type_id).copied()
    }

    /// Acquire ownership of a processor. Blocks until the previous owner
    /// releases; held for the whole ownership span.
    pub(crate) fn lock_actor(&self, actor: ActorId) -> MutexGuard<'_, ActorCell> {
        self.actors[actor]
            .cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one `tick` of `actor`. Returns whether it produced output.
    pub(crate) fn tick_actor(&self, actor: ActorId, cell: &mut ActorCell) -> bool {
        let outbox = GraphOutbox::new(self, actor);
        cell.tick(&outbox)
    }

    /// Pop and deliver at most one message from `edge` into the destination
    /// processor. Returns whether a message was delivered.
    pub(crate) fn dispatch_one(&self, edge: EdgeId, cell: &mut ActorCell) -> bool {
        let slot = &self.edges[edge];
        let Some(msg) = slot.queue.pop() else {
            return false;
        };
        let sender = &self.actors[slot.from];
        let origin = Origin::new(slot.from, sender.type_id, sender.name);
        let outbox = GraphOutbox::new(self, slot.to);
        cell.receive(origin, msg, &outbox);
        true
    }

    /// Type-erased send path: resolve the edge, enqueue, wake the thread
    /// driving the destination.
    pub(crate) fn push_message(
        &self,
        from: ActorId,
        to: TypeId,
        msg: BoxedMessage,
    ) -> Result<(), shardpool_api::SendError> {
        let message = msg.type_tag();
        let Some(&edge) = self.routes.get(&(from, to, message)) else {
            return Err(shardpool_api::SendError::NoSuchEdge {
                from: self.actors[from].name.to_string(),
                to,
                message,
            });
        };
        let slot = &self.edges[edge];
        slot.queue.push(msg);
        if let Some(signal) = self.wake_of(edge).as_ref() {
            signal.notify();
        }
        Ok(())
    }

    pub(crate) fn set_wake_signal(&self, edge: EdgeId, signal: Option<Arc<WakeSignal>>) {
        *self.edges[edge]
            .wake
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = signal;
    }

    /// Point the wake signal of every edge delivering to one of `actors`
    /// at `signal`. Called by the thread that just acquired those actors.
    pub(crate) fn rewire_wake_signals(&self, actors: &[ActorId], signal: &Arc<WakeSignal>) {
        for &actor in actors {
            for &edge in self.incoming_edges(actor) {
                self.set_wake_signal(edge, Some(Arc::clone(signal)));
            }
        }
    }

    fn wake_of(&self, edge: EdgeId) -> Option<Arc<WakeSignal>> {
        self.edges[edge]
            .wake
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn log_topology(&self) {
        for (id, actor) in self.actors.iter().enumerate() {
            debug!(
                actor = id,
                name = actor.name,
                incoming = ?actor.incoming,
                outgoing = ?actor.outgoing,
                "graph node"
            );
        }
    }
}
