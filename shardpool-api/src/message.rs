use std::any::TypeId;

use downcast_rs::{impl_downcast, Downcast};

/// A value that travels along an edge of the processor graph.
///
/// Implementors are plain data types; the runtime never inspects a message
/// beyond its type tag, which it uses to resolve the carrying edge.
///
/// ```
/// use shardpool_api::Message;
///
/// #[derive(Debug)]
/// struct IntMessage(i64);
///
/// impl Message for IntMessage {}
/// ```
pub trait Message: Downcast + Send {}
impl_downcast!(Message);

/// Owned, type-erased message as it sits in an edge queue.
pub type BoxedMessage = Box<dyn Message>;

impl dyn Message {
    /// Runtime tag of the concrete message type, used by the edge registry.
    pub fn type_tag(&self) -> TypeId {
        self.as_any().type_id()
    }
}

impl std::fmt::Debug for dyn Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn Message")
    }
}
