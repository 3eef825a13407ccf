use thiserror::Error;

/// Errors detected while building the actor graph from a topology.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("topology declares no edges")]
    EmptyTopology,
    #[error("duplicate edge declaration: {0}")]
    DuplicateEdge(String),
}

/// Errors in a sharding configuration or the pool's thread setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker pool must have at least one thread")]
    ZeroThreads,
    #[error("configuration has {slots} thread slots, pool has {threads} threads")]
    SlotCountMismatch { slots: usize, threads: usize },
    #[error("thread slot {thread} owns no processors")]
    EmptySlot { thread: usize },
    #[error("processor {actor} appears in more than one thread slot")]
    DuplicateActor { actor: usize },
    #[error("processor {actor} is missing from the configuration")]
    MissingActor { actor: usize },
    #[error("processor index {actor} is out of range ({count} processors)")]
    UnknownActor { actor: usize, count: usize },
}

/// Top-level error for pool construction.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("graph build failed: {0}")]
    Build(#[from] BuildError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
