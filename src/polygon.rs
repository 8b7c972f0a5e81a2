//! Polygons as consumed by the spatial trees: an ordered vertex ring plus a
//! supporting plane and optional caller metadata.

use crate::float_types::Real;
use crate::plane::Plane;
use nalgebra::Point3;
use std::fmt::Debug;

/// A polygon ring vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
}

impl Vertex {
    pub const fn new(pos: Point3<Real>) -> Self {
        Self { pos }
    }

    /// Linear interpolation toward `other`; used to create the two shared
    /// intersection vertices when a splitting plane slices an edge.
    pub fn interpolate(&self, other: &Self, t: Real) -> Self {
        Self { pos: self.pos + (other.pos - self.pos) * t }
    }
}

/// A convex polygon, defined by an ordered ring of vertices, its supporting
/// plane, and a generic metadata field `S` the trees carry around untouched
/// (material id, portal handle, whatever the embedding engine needs).
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
    pub metadata: Option<S>,
}

impl<S: Clone + Debug> Polygon<S> {
    /// Build a polygon from its vertex ring; the supporting plane is derived
    /// from the first three vertices.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Self {
        let plane = if vertices.len() >= 3 {
            Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos)
        } else {
            Plane::from_normal(nalgebra::Vector3::z(), 0.0)
        };
        Self { vertices, plane, metadata }
    }

    /// Build a polygon with an explicit supporting plane. Split fragments use
    /// this to inherit the parent polygon's plane unchanged.
    pub const fn with_plane(vertices: Vec<Vertex>, plane: Plane, metadata: Option<S>) -> Self {
        Self { vertices, plane, metadata }
    }

    /// Convenience constructor from bare points.
    pub fn from_points(points: &[[Real; 3]], metadata: Option<S>) -> Self {
        let vertices = points
            .iter()
            .map(|&[x, y, z]| Vertex::new(Point3::new(x, y, z)))
            .collect();
        Self::new(vertices, metadata)
    }

    /// Unsigned area of the polygon (fan triangulation from the first
    /// vertex). Used by tests and the octree coverage checks.
    pub fn area(&self) -> Real {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let p0 = self.vertices[0].pos;
        let mut doubled = nalgebra::Vector3::zeros();
        for w in self.vertices[1..].windows(2) {
            doubled += (w[0].pos - p0).cross(&(w[1].pos - p0));
        }
        doubled.norm() * 0.5
    }
}
