//! Error types for the collections.

use thiserror::Error;

use super::selection::NodeId;

/// Boxed error produced by a page source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`PagedCollection`](super::PagedCollection) operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// An argument was outside its valid range.
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument {
        /// The offending parameter.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The page source failed; the original error is the `source()`.
    #[error("page source failed: {0}")]
    SourceFailure(#[source] BoxError),

    /// The page source cancelled the fetch.
    #[error("page fetch was cancelled")]
    Cancelled,
}

impl CollectionError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    /// Returns `true` for the benign cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors surfaced by [`SelectionTree`](super::SelectionTree) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The active selection mode forbids assigning this node directly.
    #[error("selection of node {node:?} cannot be assigned directly: {reason}")]
    PolicyViolation {
        /// The node the caller tried to assign.
        node: NodeId,
        /// Why the mode forbids it.
        reason: &'static str,
    },

    /// The node handle does not refer to a live node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// A child position was out of range.
    #[error("child index {index} out of range (len {len})")]
    InvalidIndex {
        /// The requested position.
        index: usize,
        /// The number of children.
        len: usize,
    },
}

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Result type for selection tree operations.
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;
