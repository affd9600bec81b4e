//! The top-level error taxonomy. Every component crate defines its own
//! `thiserror` enum for the errors it can actually produce; each converts
//! into this one via `#[from]` so a caller that wants a single error type
//! (the out-of-scope tool-invocation server) can depend on just this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillforgeError {
    // --- Input errors: surfaced to the caller, no retry ---
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    #[error("malformed skill file: {0}")]
    MalformedFile(String),
    #[error("unknown skill id: {0}")]
    UnknownSkillId(String),
    #[error("unknown repository id: {0}")]
    UnknownRepoId(String),

    // --- Resource errors: caller may retry idempotent operations ---
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("storage busy")]
    StorageBusy,
    #[error("store is corrupt: {0}")]
    Corrupt(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    // --- External errors: caller may retry ---
    #[error("clone failed: {0}")]
    CloneFailed(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    // --- Consistency errors ---
    #[error("reindex completed with {failed} per-file failures out of {total}")]
    PartialIndex { total: usize, failed: usize },
    #[error("graph store unavailable, degraded to vector-only search")]
    GraphUnavailable,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}; store must be rebuilt")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    // --- Cancellation: never a bug, always propagated ---
    #[error("operation cancelled")]
    Cancelled,
}
