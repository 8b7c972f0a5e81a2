//! Test support library
//! Provides various helper functions & utilities for tests.

use nalgebra::Point3;
use viscull::float_types::Real;
use viscull::polygon::{Polygon, Vertex};

/// Quick helper to compare floating-point results with an acceptable tolerance.
#[allow(dead_code)]
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Helper to make a tagged polygon from bare points; the supporting plane is
/// derived from the first three.
#[allow(dead_code)]
pub fn make_polygon(points: &[[Real; 3]], tag: u32) -> Polygon<u32> {
    let vertices = points
        .iter()
        .map(|&[x, y, z]| Vertex::new(Point3::new(x, y, z)))
        .collect();
    Polygon::new(vertices, Some(tag))
}

/// Axis-aligned square of side `size` centered at `center`, lying in the
/// plane perpendicular to `axis` (0 = X, 1 = Y, 2 = Z). Wound so the plane
/// normal points toward the positive axis.
#[allow(dead_code)]
pub fn square(center: [Real; 3], axis: usize, size: Real, tag: u32) -> Polygon<u32> {
    let h = size * 0.5;
    let (u, v) = match axis {
        0 => (1usize, 2usize),
        1 => (2, 0),
        _ => (0, 1),
    };
    let corners = [[-h, -h], [h, -h], [h, h], [-h, h]];
    let points: Vec<[Real; 3]> = corners
        .iter()
        .map(|&[du, dv]| {
            let mut p = center;
            p[u] += du;
            p[v] += dv;
            p
        })
        .collect();
    make_polygon(&points, tag)
}

/// Flatten the tags of the visited polygons, in visit order.
#[allow(dead_code)]
pub fn tags_of(polygons: &[Polygon<u32>]) -> Vec<u32> {
    polygons.iter().filter_map(|p| p.metadata).collect()
}
