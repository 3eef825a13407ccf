// Type aliases shared by the interface layer and the runtime.

/// Dense index of a message processor inside a built graph.
pub type ActorId = usize;

/// Dense index of a directed edge inside a built graph.
pub type EdgeId = usize;
