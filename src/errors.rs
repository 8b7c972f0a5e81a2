//! Build errors
//!
//! Degenerate geometry is never an error in this crate: trees and coverage
//! buffers recover locally (skip, treat as invisible, fall back to an
//! identity orientation). The only condition surfaced to the caller is
//! resource exhaustion while building a tree.

use std::collections::TryReserveError;

/// Errors that can be returned from the `build` entry points.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Reserving storage for tree nodes or split fragments failed.
    #[error("allocation failed while building spatial tree: {0}")]
    AllocationFailed(#[from] TryReserveError),
}
