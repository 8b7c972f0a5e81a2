//! Plane math: point/polygon classification against a splitting plane and
//! polygon splitting along it.
//!
//! Every BSP and octree decision in the crate funnels through
//! [`Plane::orient_point`], so the front/back convention lives here and
//! nowhere else: the front half-space is the side the normal points into,
//! and anything within [`EPSILON`](crate::float_types::EPSILON) of the plane
//! counts as coplanar.

use crate::float_types::{EPSILON, Real};
use crate::polygon::{Polygon, Vertex};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

// Classification constants. FRONT and BACK are bit flags so a polygon
// classification can be built by OR-ing its vertex classifications.
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane in 3D space: unit normal plus distance from origin along it
/// (plane equation `n·p = w`).
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and distance.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let norm = normal.norm();
        if norm < EPSILON {
            // Degenerate input, fall back to Z-up through the origin.
            return Self { normal: Vector3::z(), w: 0.0 };
        }
        Self { normal: normal / norm, w: w / norm }
    }

    /// Create a plane from three points, normal following the right-hand
    /// rule: `(p2-p1) × (p3-p1)`.
    pub fn from_points(p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>) -> Self {
        let normal = (p2 - p1).cross(&(p3 - p1));
        if normal.norm_squared() < EPSILON * EPSILON {
            return Self { normal: Vector3::z(), w: 0.0 };
        }
        let normal = normal.normalize();
        Self { w: normal.dot(&p1.coords), normal }
    }

    /// Axis-aligned plane `p[axis] = pos` with the normal pointing along
    /// the positive axis. `axis` is 0 (X), 1 (Y) or 2 (Z).
    pub fn axis_aligned(axis: usize, pos: Real) -> Self {
        let mut normal = Vector3::zeros();
        normal[axis] = 1.0;
        Self { normal, w: pos }
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    /// Flip the plane in place (reverse normal and distance).
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn flipped(&self) -> Self {
        Self { normal: -self.normal, w: -self.w }
    }

    /// Signed distance from the plane, positive on the front side.
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as [`FRONT`], [`BACK`] or [`COPLANAR`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let dist = self.signed_distance(point);
        if dist > EPSILON {
            FRONT
        } else if dist < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Classify a whole polygon with respect to the plane. Returns a bitmask
    /// of FRONT and BACK: [`COPLANAR`], [`FRONT`], [`BACK`] or [`SPANNING`].
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// True when `other` describes the same plane within tolerance, in either
    /// orientation. Used by the most-on-splitter heuristic.
    pub fn near_equal(&self, other: &Self) -> bool {
        let d = self.normal.dot(&other.normal);
        (d > 1.0 - EPSILON && (self.w - other.w).abs() < EPSILON)
            || (d < -1.0 + EPSILON && (self.w + other.w).abs() < EPSILON)
    }

    /// Splits `polygon` by this plane, returning four buckets:
    /// `(coplanar_front, coplanar_back, front, back)`.
    ///
    /// A spanning polygon is sliced into two new polygons whose rings, joined
    /// at the two intersection vertices, reconstruct the original ring. The
    /// pieces keep the original polygon's supporting plane; recomputing it
    /// from the sliced ring only accumulates error.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon<S: Clone + Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            // True spanning, do the split.
            _ => {
                let mut split_front = Vec::<Vertex>::new();
                let mut split_back = Vec::<Vertex>::new();

                for i in 0..polygon.vertices.len() {
                    let j = (i + 1) % polygon.vertices.len();
                    let type_i = types[i];
                    let type_j = types[j];
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(vertex_i.clone());
                    }
                    if type_i != FRONT {
                        split_back.push(vertex_i.clone());
                    }

                    // Edge crosses the plane: the intersection vertex joins
                    // both rings so the two pieces share the cut.
                    if (type_i | type_j) == SPANNING {
                        let denom = self.normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > EPSILON {
                            let t = (self.w - self.normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new.clone());
                            split_back.push(vertex_new);
                        }
                    }
                }

                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(
                        split_front,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(
                        split_back,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }
}
