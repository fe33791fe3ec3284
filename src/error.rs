//! The one error type shared by every container in this crate.

/// Everything that can go wrong when talking to a map, table or one of the
/// sequence collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key is not stored.
    #[error("key not found")]
    NotFound,

    /// Tried to take an item out of an empty stack or queue.
    #[error("collection is empty")]
    Empty,

    /// A positional index went past the end of a sequence.
    #[error("index {index} is out of range for a sequence of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// A table was configured with values it can't work with.
    #[error("invalid table config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
