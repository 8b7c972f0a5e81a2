use nalgebra::{Point3, Vector3};
use viscull::{
    Polygon,
    float_types::{EPSILON, Real},
    plane::{BACK, COPLANAR, FRONT, Plane, SPANNING},
};

mod support;

use crate::support::{approx_eq, make_polygon, square};

#[test]
fn flip() {
    let mut plane = Plane::from_normal(Vector3::y(), 2.0);
    plane.flip();
    assert_eq!(plane.normal(), Vector3::new(0.0, -1.0, 0.0));
    assert_eq!(plane.offset(), -2.0);
}

#[test]
fn orient_point_sides() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, 1.0)), FRONT);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, -1.0)), BACK);
    assert_eq!(plane.orient_point(&Point3::new(5.0, -3.0, 0.0)), COPLANAR);
    // Within tolerance counts as on-plane.
    assert_eq!(
        plane.orient_point(&Point3::new(0.0, 0.0, EPSILON * 0.5)),
        COPLANAR
    );
}

#[test]
fn classify_polygon_or_folds_vertex_sides() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let front = square([0.0, 0.0, 1.0], 2, 1.0, 0);
    let back = square([0.0, 0.0, -1.0], 2, 1.0, 1);
    let coplanar = square([0.0, 0.0, 0.0], 2, 1.0, 2);
    let spanning = square([0.0, 0.0, 0.0], 0, 2.0, 3);
    assert_eq!(plane.classify_polygon(&front), FRONT);
    assert_eq!(plane.classify_polygon(&back), BACK);
    assert_eq!(plane.classify_polygon(&coplanar), COPLANAR);
    assert_eq!(plane.classify_polygon(&spanning), SPANNING);

    // Touching the plane with one edge is not spanning.
    let touching = make_polygon(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ],
        4,
    );
    assert_eq!(plane.classify_polygon(&touching), FRONT);
}

#[test]
fn split_polygon() {
    // A plane splitting space at y=0, and a square crossing it.
    let plane = Plane::from_normal(Vector3::y(), 0.0);
    let poly = square([0.0, 0.0, 0.0], 2, 2.0, 7);
    let original_area = poly.area();

    let (cf, cb, f, b) = plane.split_polygon(&poly);
    assert_eq!(cf.len(), 0);
    assert_eq!(cb.len(), 0);
    assert_eq!(f.len(), 1);
    assert_eq!(b.len(), 1);

    let front_poly = &f[0];
    let back_poly = &b[0];
    assert!(front_poly.vertices.len() >= 3);
    assert!(back_poly.vertices.len() >= 3);

    // All front vertices should have y >= 0 (within an epsilon), back y <= 0.
    for v in &front_poly.vertices {
        assert!(v.pos.y >= -EPSILON);
    }
    for v in &back_poly.vertices {
        assert!(v.pos.y <= EPSILON);
    }

    // No area is lost, and the pieces keep the original supporting plane and
    // metadata.
    let split_area: Real = f.iter().chain(&b).map(Polygon::area).sum();
    assert!(approx_eq(split_area, original_area, 1e-9));
    assert!(front_poly.plane.near_equal(&poly.plane));
    assert!(back_poly.plane.near_equal(&poly.plane));
    assert_eq!(front_poly.metadata, Some(7));
    assert_eq!(back_poly.metadata, Some(7));
}

#[test]
fn split_coplanar_polygon_buckets_by_normal_agreement() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let agreeing = square([0.0, 0.0, 0.0], 2, 1.0, 0);
    let (cf, cb, f, b) = plane.split_polygon(&agreeing);
    assert_eq!(cf.len(), 1);
    assert!(cb.is_empty() && f.is_empty() && b.is_empty());

    let mut opposing = square([0.0, 0.0, 0.0], 2, 1.0, 1);
    opposing.vertices.reverse();
    opposing.plane = opposing.plane.flipped();
    let (cf, cb, f, b) = plane.split_polygon(&opposing);
    assert_eq!(cb.len(), 1);
    assert!(cf.is_empty() && f.is_empty() && b.is_empty());
}

#[test]
fn near_equal_ignores_orientation() {
    let a = Plane::from_normal(Vector3::z(), 2.0);
    let b = a.flipped();
    assert!(a.near_equal(&b));
    let c = Plane::from_normal(Vector3::z(), 2.5);
    assert!(!a.near_equal(&c));
}

#[test]
fn axis_aligned_planes() {
    for (axis, expected) in [(0, Vector3::x()), (1, Vector3::y()), (2, Vector3::z())] {
        let plane = Plane::axis_aligned(axis, 3.0);
        assert!(approx_eq((plane.normal() - expected).norm(), 0.0, 1e-12));
        assert!(approx_eq(plane.offset(), 3.0, 1e-12));
    }
}

#[test]
fn polygon_plane_from_winding() {
    let poly = square([0.0, 0.0, 5.0], 2, 1.0, 0);
    assert!(approx_eq(
        (poly.plane.normal() - Vector3::z()).norm(),
        0.0,
        1e-12
    ));
    assert!(approx_eq(poly.plane.offset(), 5.0, 1e-12));
}

#[test]
fn polygon_area() {
    let unit = square([1.0, 2.0, 3.0], 2, 1.0, 0);
    assert!(approx_eq(unit.area(), 1.0, 1e-12));
    let big = square([0.0, 0.0, 0.0], 0, 2.0, 0);
    assert!(approx_eq(big.area(), 4.0, 1e-12));
}
