//! Structured error kinds surfaced across the engine's public contract.
//!
//! Replaces the teacher's panic/bool-return style (`add_wall(..) -> bool`,
//! `parse_state_string` panicking on malformed input) with a result-typed
//! channel, per the four failure kinds the engine distinguishes.

use thiserror::Error;

/// The four failure kinds the engine can surface to a caller.
#[derive(Debug, Clone, Error)]
pub enum CorridorsError {
    /// Caller violated a precondition: `simulate` on a terminal root,
    /// `evaluate` on an already-evaluated node, an unknown move text, a
    /// state assumed to be in the tree that isn't. Not retried; the engine
    /// state is left unchanged.
    #[error("illegal operation `{operation}`: {detail}")]
    IllegalOperation { operation: &'static str, detail: String },

    /// A rollout hit `MAX_ROLLOUT_ITERS` without reaching a terminal or
    /// heuristically-decided state. Indicates a game region with cycles
    /// and no heuristic; the engine is left unusable.
    #[error("search stalled after {iterations} rollout iterations at: {state_display}")]
    SearchStalled { iterations: usize, state_display: String },

    /// State deserialization failed or a config value is out of range.
    /// Rejected at construction or on the offending call.
    #[error("invalid input for `{field}`: {detail}")]
    InvalidInput { field: &'static str, detail: String },

    /// An internal invariant was violated (equity outside [-1, 1], a
    /// selection scan that never picked a child, a worker-thread panic).
    /// Fatal; the caller must construct a fresh engine.
    #[error("internal invariant `{invariant}` violated: {context}")]
    InternalInvariantViolation { invariant: &'static str, context: String },
}

pub type Result<T> = std::result::Result<T, CorridorsError>;
