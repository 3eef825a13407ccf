use std::any::TypeId;

use thiserror::Error;

/// Errors surfaced by [`crate::Outbox`] sends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("no declared edge from {from} to destination {to:?} carrying {message:?}")]
    NoSuchEdge {
        /// Name of the sending processor.
        from: String,
        /// Type tag of the requested destination processor.
        to: TypeId,
        /// Type tag of the message.
        message: TypeId,
    },
}
