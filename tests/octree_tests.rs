use nalgebra::Point3;
use viscull::{
    Octree, Polygon,
    bsp::BuildContext,
    float_types::Real,
};

mod support;

use crate::support::{approx_eq, square, tags_of};

fn bounds() -> (Point3<Real>, Point3<Real>) {
    (Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
}

/// One small square per octant, centered at (±0.5, ±0.5, ±0.5), tagged with
/// its octant index (bit 4 = +x, bit 2 = +y, bit 1 = +z).
fn octant_squares() -> Vec<Polygon<u32>> {
    (0u32..8)
        .map(|i| {
            let c = |bit: u32| if i & bit != 0 { 0.5 } else { -0.5 };
            square([c(4), c(2), c(1)], 2, 0.2, i)
        })
        .collect()
}

#[test]
fn small_input_collapses_to_a_single_leaf() {
    let polygons = vec![
        square([0.0, 0.0, 0.0], 2, 2.0, 0),
        square([0.0, 0.0, 0.0], 0, 2.0, 1),
        square([0.0, 0.0, 0.0], 1, 2.0, 2),
    ];
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(polygons, bmin, bmax, 5, &mut ctx).unwrap();

    assert!(tree.is_single_leaf());
    assert_eq!(tree.leaf_threshold(), 5);
    assert_eq!(tree.bounding_box(), (&bmin, &bmax));

    // The mini-BSP still orders the contents.
    let mut count = 0;
    let rc: Option<()> = tree.back2front(&Point3::new(5.0, 5.0, 5.0), &mut |polys| {
        count += polys.len();
        None
    });
    assert!(rc.is_none());
    assert_eq!(count, tree.all_polygons().len());
}

#[test]
fn children_follow_the_octant_bit_convention() {
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(octant_squares(), bmin, bmax, 1, &mut ctx).unwrap();
    assert!(!tree.is_single_leaf());

    // Nothing straddles a splitting plane, so no fragments appear.
    let mut all = tree.all_polygons();
    assert_eq!(all.len(), 8);
    all.sort_by_key(|p| p.metadata);
    for (i, poly) in all.iter().enumerate() {
        assert_eq!(poly.metadata, Some(i as u32));
    }

    // Front-to-back from deep inside octant 7 starts with octant 7's square
    // and ends with the mirror octant 0.
    let mut order = Vec::new();
    let rc: Option<()> = tree.front2back(&Point3::new(0.9, 0.9, 0.9), &mut |polys| {
        order.extend(tags_of(polys));
        None
    });
    assert!(rc.is_none());
    assert_eq!(order, vec![7, 6, 5, 3, 1, 2, 4, 0]);

    // Back-to-front is the mirrored sequence.
    let mut order = Vec::new();
    let rc: Option<()> = tree.back2front(&Point3::new(0.9, 0.9, 0.9), &mut |polys| {
        order.extend(tags_of(polys));
        None
    });
    assert!(rc.is_none());
    assert_eq!(order, vec![0, 1, 2, 4, 6, 5, 3, 7]);
}

#[test]
fn straddling_polygons_are_sliced_without_area_loss() {
    // Three mutually crossing squares through the box center; the octant
    // split slices all of them repeatedly.
    let polygons = vec![
        square([0.0, 0.0, 0.0], 2, 2.0, 0),
        square([0.0, 0.0, 0.0], 0, 2.0, 1),
        square([0.0, 0.0, 0.0], 1, 2.0, 2),
    ];
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(polygons, bmin, bmax, 2, &mut ctx).unwrap();

    let fragments = tree.all_polygons();
    assert!(fragments.len() > 3);
    for tag in 0..3u32 {
        let area: Real = fragments
            .iter()
            .filter(|p| p.metadata == Some(tag))
            .map(Polygon::area)
            .sum();
        assert!(approx_eq(area, 4.0, 1e-6), "tag {tag} area {area}");
    }

    // Traversal sees every fragment exactly once.
    let mut visited = 0;
    let rc: Option<()> = tree.back2front(&Point3::new(0.3, 0.2, 0.1), &mut |polys| {
        visited += polys.len();
        None
    });
    assert!(rc.is_none());
    assert_eq!(visited, fragments.len());
}

#[test]
fn visitor_abort_propagates_through_interior_nodes() {
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(octant_squares(), bmin, bmax, 1, &mut ctx).unwrap();

    let mut calls = 0;
    let rc = tree.front2back(&Point3::new(0.9, 0.9, 0.9), &mut |polys| {
        calls += 1;
        polys[0].metadata
    });
    assert_eq!(calls, 1);
    assert_eq!(rc, Some(7));
}

#[test]
fn empty_octants_are_skipped() {
    // Two squares in opposite octants only.
    let polygons = vec![square([0.5, 0.5, 0.5], 2, 0.2, 7), square([-0.5, -0.5, -0.5], 2, 0.2, 0)];
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(polygons, bmin, bmax, 1, &mut ctx).unwrap();

    let mut order = Vec::new();
    let rc: Option<()> = tree.back2front(&Point3::new(0.9, 0.9, 0.9), &mut |polys| {
        order.extend(tags_of(polys));
        None
    });
    assert!(rc.is_none());
    assert_eq!(order, vec![0, 7]);
}

#[test]
fn dynamic_hooks_are_inert() {
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree = Octree::build(octant_squares(), bmin, bmax, 1, &mut ctx).unwrap();

    tree.add_dynamic_polygons(vec![square([0.0, 0.0, 0.0], 2, 0.1, 99)]);
    tree.remove_dynamic_polygons();
    assert_eq!(tree.all_polygons().len(), 8);
}

#[test]
fn empty_input_is_a_single_empty_leaf() {
    let (bmin, bmax) = bounds();
    let mut ctx = BuildContext::from_seed(1);
    let mut tree: Octree<u32> = Octree::build(Vec::new(), bmin, bmax, 4, &mut ctx).unwrap();
    assert!(tree.is_single_leaf());
    assert!(tree.all_polygons().is_empty());
    let rc: Option<()> =
        tree.back2front(&Point3::origin(), &mut |_| panic!("nothing to visit"));
    assert!(rc.is_none());
}
