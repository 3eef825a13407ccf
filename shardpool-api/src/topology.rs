use std::any::{type_name, TypeId};

use crate::actor::MessageProcessor;
use crate::message::Message;

/// One endpoint of an edge declaration: a processor type plus the factory
/// the graph builder uses to instantiate it (once, however many edges
/// reference it).
#[derive(Debug, Clone, Copy)]
pub struct NodeDecl {
    type_id: TypeId,
    name: &'static str,
    build: fn() -> Box<dyn MessageProcessor>,
}

fn build_node<A: MessageProcessor + Default>() -> Box<dyn MessageProcessor> {
    Box::new(A::default())
}

impl NodeDecl {
    pub fn of<A: MessageProcessor + Default>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name: type_name::<A>(),
            build: build_node::<A>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Box<dyn MessageProcessor> {
        (self.build)()
    }
}

/// The message type an edge carries.
#[derive(Debug, Clone, Copy)]
pub struct MessageDecl {
    type_id: TypeId,
    name: &'static str,
}

impl MessageDecl {
    pub fn of<M: Message>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// One directed, typed edge declaration.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDecl {
    pub from: NodeDecl,
    pub to: NodeDecl,
    pub message: MessageDecl,
}

/// Declarative description of the whole processor graph: a static list of
/// (From, To, Message) edges. Processor types referenced by several edges
/// are deduplicated at graph-build time into a single instance.
#[derive(Debug, Default)]
pub struct Topology {
    edges: Vec<EdgeDecl>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an edge from processor type `From` to processor type `To`
    /// carrying messages of type `M`.
    pub fn edge<From, To, M>(mut self) -> Self
    where
        From: MessageProcessor + Default,
        To: MessageProcessor + Default,
        M: Message,
    {
        self.edges.push(EdgeDecl {
            from: NodeDecl::of::<From>(),
            to: NodeDecl::of::<To>(),
            message: MessageDecl::of::<M>(),
        });
        self
    }

    pub fn edges(&self) -> &[EdgeDecl] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
