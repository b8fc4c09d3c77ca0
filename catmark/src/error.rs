//! Error types for the catmark crate.

use thiserror::Error;

/// Main error type for subdivision operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A vertex rule was evaluated for a point no face references.
    #[error("Vertex {vertex} has no incident faces; its vertex point is undefined")]
    DegenerateVertex { vertex: u32 },

    /// Index out of bounds.
    #[error("Index {index} out of bounds (max: {max})")]
    IndexOutOfBounds { index: usize, max: usize },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// Invalid topology.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// An edge shared by more than two faces, rejected in strict mode.
    #[error("Edge ({}, {}) is shared by {faces} faces", .edge.0, .edge.1)]
    NonManifoldEdge { edge: (u32, u32), faces: usize },
}

/// Result type alias using our Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
