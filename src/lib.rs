//! CPU-side **spatial visibility** structures: binary space partition trees in
//! 3D and 2D, an octree with mini-BSP leaves, a scanline coverage buffer
//! ("C-buffer") for occlusion testing, a six-face perspective coverage cube,
//! and an oriented-bounding-box hierarchy builder for collision queries.
//!
//! All trees share one traversal contract: build once from a primitive set,
//! then walk the primitives in guaranteed back-to-front or front-to-back
//! order relative to a viewpoint, with a visitor callback that can abort the
//! whole traversal by returning a value.
//!
//! # Features
//! - **f64** (default): use f64 as [Real](float_types::Real)
//! - **f32**: use f32 as Real, conflicts with f64

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod plane;
pub mod polygon;
pub mod bsp;
pub mod bsp2d;
pub mod octree;
pub mod cbuffer;
pub mod covcube;
pub mod collision;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use bsp::{BspStatistics, BspTree};
pub use bsp2d::BspTree2D;
pub use cbuffer::CBuffer;
pub use covcube::CoverageCube;
pub use octree::Octree;
pub use polygon::{Polygon, Vertex};
