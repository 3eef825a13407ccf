use std::any::TypeId;

use downcast_rs::{impl_downcast, Downcast};

use crate::errors::SendError;
use crate::message::{BoxedMessage, Message};
use crate::types::ActorId;

/// Identity of the processor a message arrived from.
///
/// The runtime replacement for dispatching on the sender's static type:
/// receivers that care who sent a message match on [`Origin::is`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    actor: ActorId,
    type_id: TypeId,
    name: &'static str,
}

impl Origin {
    pub fn new(actor: ActorId, type_id: TypeId, name: &'static str) -> Self {
        Self {
            actor,
            type_id,
            name,
        }
    }

    /// Dense index of the sending processor.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// True when the sending processor is of type `A`.
    pub fn is<A: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<A>()
    }

    /// Human-readable name of the sending processor type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Capability to emit messages from inside `tick`/`receive`.
///
/// Sends resolve the carrying edge from (calling processor, destination
/// processor type, message type); sending along an undeclared edge is a
/// runtime error. A send enqueues without blocking and wakes the thread
/// currently driving the destination processor.
pub trait Outbox {
    /// Type-erased send: routes `msg` along the edge declared from the
    /// calling processor to the processor type identified by `to`.
    fn send_boxed(&self, to: TypeId, msg: BoxedMessage) -> Result<(), SendError>;

    /// Dense index of the processor this outbox belongs to.
    fn from_actor(&self) -> ActorId;
}

impl<'a> dyn Outbox + 'a {
    /// Send `msg` to the (single) processor of type `To`.
    pub fn send<To, M>(&self, msg: M) -> Result<(), SendError>
    where
        To: 'static,
        M: Message,
    {
        self.send_boxed(TypeId::of::<To>(), Box::new(msg))
    }
}

/// A node in the message-passing graph.
///
/// Processors are single-threaded from their own point of view: the runtime
/// never runs `tick` or `receive` for one processor concurrently with
/// itself, so implementations keep plain mutable state. Both hooks must be
/// fast and self-contained; a panic from either is caught at cycle
/// granularity, cataloged, and does not stop the system.
pub trait MessageProcessor: Downcast + Send {
    /// Self-driven activity, invoked once per scheduling cycle.
    /// Return `true` when the call produced output, so the driving thread
    /// knows it is not idle.
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        let _ = outbox;
        false
    }

    /// React to one inbound message.
    fn receive(&mut self, from: Origin, msg: BoxedMessage, outbox: &dyn Outbox) {
        let _ = (msg, outbox);
        tracing::trace!(from = from.name(), "message dropped by default receive");
    }
}
impl_downcast!(MessageProcessor);
