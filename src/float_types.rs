//! Scalar precision selection and the crate-wide geometric tolerance.

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Tolerance used for every "on plane" / "on line" / near-duplicate-vertex
/// decision in the crate. All components must agree on the same value or
/// classification becomes inconsistent between the trees and the coverage
/// buffers.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-4;

/// Tolerance used for every "on plane" / "on line" / near-duplicate-vertex
/// decision in the crate. All components must agree on the same value or
/// classification becomes inconsistent between the trees and the coverage
/// buffers.
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-6;
