//! Octree over 3D polygons with mini-BSP leaves.
//!
//! The octree handles the coarse spatial sort: each interior node splits its
//! axis-aligned box into 8 octants through the box center, slicing straddling
//! polygons along the axis planes. Once a node's polygon count drops to the
//! leaf threshold, the residual set goes into a small 3D BSP tree
//! ([`crate::bsp::BspTree`]) which takes over exact ordering inside the
//! leaf. Traversal therefore delegates to the mini-BSP's own walk at the
//! leaves and orders the 8 children by the viewpoint's octant everywhere
//! else.

use crate::bsp::{BspTree, BuildContext};
use crate::errors::BuildError;
use crate::float_types::{EPSILON, Real};
use crate::plane::Plane;
use crate::polygon::Polygon;
use nalgebra::Point3;
use std::fmt::Debug;

/// Octant index bits, relative to the node center: bit 4 set when `x >
/// center.x`, bit 2 for `y > center.y`, bit 1 for `z > center.z`.
const X_BIT: usize = 4;
const Y_BIT: usize = 2;
const Z_BIT: usize = 1;

#[derive(Debug, Clone)]
enum OctreeNode<S: Clone> {
    Interior {
        center: Point3<Real>,
        children: [Option<Box<OctreeNode<S>>>; 8],
    },
    Leaf {
        bsp: BspTree<S>,
    },
}

/// An octree over 3D polygons, built over an axis-aligned bounding volume.
#[derive(Debug, Clone)]
pub struct Octree<S: Clone> {
    root: OctreeNode<S>,
    bbox_min: Point3<Real>,
    bbox_max: Point3<Real>,
    leaf_threshold: usize,
}

impl<S: Clone + Debug> Octree<S> {
    /// Build an octree over `polygons`, bounded by `[bbox_min, bbox_max]`.
    /// Nodes with at most `leaf_threshold` polygons become mini-BSP leaves.
    pub fn build(
        polygons: Vec<Polygon<S>>,
        bbox_min: Point3<Real>,
        bbox_max: Point3<Real>,
        leaf_threshold: usize,
        ctx: &mut BuildContext,
    ) -> Result<Self, BuildError> {
        let root = build_node(polygons, &bbox_min, &bbox_max, leaf_threshold, ctx)?;
        Ok(Self { root, bbox_min, bbox_max, leaf_threshold })
    }

    pub const fn bounding_box(&self) -> (&Point3<Real>, &Point3<Real>) {
        (&self.bbox_min, &self.bbox_max)
    }

    pub const fn leaf_threshold(&self) -> usize {
        self.leaf_threshold
    }

    /// True when the root is a single mini-BSP leaf (no interior nodes).
    pub const fn is_single_leaf(&self) -> bool {
        matches!(self.root, OctreeNode::Leaf { .. })
    }

    /// Visit all polygon fragments back-to-front as seen from `pos`. Leaves
    /// delegate to the mini-BSP walk; `Some` from the visitor aborts the
    /// whole traversal and is returned.
    pub fn back2front<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, false)
    }

    /// Visit all polygon fragments front-to-back as seen from `pos`.
    pub fn front2back<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, true)
    }

    /// Every polygon fragment across all leaves, in storage order.
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                OctreeNode::Leaf { bsp } => result.extend(bsp.all_polygons()),
                OctreeNode::Interior { children, .. } => {
                    stack.extend(children.iter().filter_map(|c| c.as_deref()));
                },
            }
        }
        result
    }

    /// Extension hook for runtime polygon insertion. Surrounding collaborators
    /// (mesh invalidation paths) call this unconditionally; the structure
    /// itself does not yet support incremental updates, so the polygons are
    /// dropped. Rebuild the tree to pick up new geometry.
    pub fn add_dynamic_polygons(&mut self, polygons: Vec<Polygon<S>>) {
        let _ = polygons;
    }

    /// Extension hook matching [`Self::add_dynamic_polygons`]; currently a
    /// no-op.
    pub fn remove_dynamic_polygons(&mut self) {}
}

/// Split `polygons` along the axis plane `p[axis] = pos` into the above/below
/// halves. Coplanar polygons ride with the half their normal agrees with, so
/// nothing is lost or duplicated.
fn split_along<S: Clone + Debug>(
    polygons: Vec<Polygon<S>>,
    axis: usize,
    pos: Real,
) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
    let plane = Plane::axis_aligned(axis, pos);
    let mut above = Vec::new();
    let mut below = Vec::new();
    for polygon in &polygons {
        let (coplanar_front, coplanar_back, front, back) = plane.split_polygon(polygon);
        above.extend(coplanar_front);
        above.extend(front);
        below.extend(coplanar_back);
        below.extend(back);
    }
    (above, below)
}

fn build_node<S: Clone + Debug>(
    polygons: Vec<Polygon<S>>,
    bbox_min: &Point3<Real>,
    bbox_max: &Point3<Real>,
    leaf_threshold: usize,
    ctx: &mut BuildContext,
) -> Result<OctreeNode<S>, BuildError> {
    // Polygons sharing an edge or corner can stay together under any number
    // of subdivisions, so a box that has shrunk to epsilon size becomes a
    // leaf no matter how many polygons remain.
    let extent = bbox_max - bbox_min;
    if polygons.len() <= leaf_threshold || extent.amax() <= EPSILON {
        return Ok(OctreeNode::Leaf { bsp: BspTree::build(polygons, ctx)? });
    }

    let center = nalgebra::center(bbox_min, bbox_max);

    // Split sequentially along X, then Y on each half, then Z on each
    // quarter, producing up to 8 fragments per input polygon.
    let (x_above, x_below) = split_along(polygons, 0, center.x);
    let mut buckets: [Vec<Polygon<S>>; 8] = Default::default();
    for (x_half, x_mask) in [(x_above, X_BIT), (x_below, 0)] {
        let (y_above, y_below) = split_along(x_half, 1, center.y);
        for (y_half, y_mask) in [(y_above, Y_BIT), (y_below, 0)] {
            let (z_above, z_below) = split_along(y_half, 2, center.z);
            buckets[x_mask | y_mask | Z_BIT] = z_above;
            buckets[x_mask | y_mask] = z_below;
        }
    }

    let mut children: [Option<Box<OctreeNode<S>>>; 8] = Default::default();
    for (i, bucket) in buckets.into_iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let mut child_min = *bbox_min;
        let mut child_max = *bbox_max;
        if i & X_BIT != 0 {
            child_min.x = center.x;
        } else {
            child_max.x = center.x;
        }
        if i & Y_BIT != 0 {
            child_min.y = center.y;
        } else {
            child_max.y = center.y;
        }
        if i & Z_BIT != 0 {
            child_min.z = center.z;
        } else {
            child_max.z = center.z;
        }
        children[i] = Some(Box::new(build_node(
            bucket,
            &child_min,
            &child_max,
            leaf_threshold,
            ctx,
        )?));
    }

    Ok(OctreeNode::Interior { center, children })
}

/// The octant of `pos` relative to `center`, using the same bit convention
/// as the build.
fn viewer_octant(pos: &Point3<Real>, center: &Point3<Real>) -> usize {
    let mut idx = 0;
    if pos.x > center.x {
        idx |= X_BIT;
    }
    if pos.y > center.y {
        idx |= Y_BIT;
    }
    if pos.z > center.z {
        idx |= Z_BIT;
    }
    idx
}

fn traverse<S, R, V>(
    node: &mut OctreeNode<S>,
    pos: &Point3<Real>,
    visit: &mut V,
    near_first: bool,
) -> Option<R>
where
    S: Clone + Debug,
    V: FnMut(&[Polygon<S>]) -> Option<R>,
{
    match node {
        OctreeNode::Leaf { bsp } => {
            if near_first {
                bsp.front2back(pos, visit)
            } else {
                bsp.back2front(pos, visit)
            }
        },
        OctreeNode::Interior { center, children } => {
            let cur = viewer_octant(pos, center);
            let far = 7 - cur;
            // The mirror octant of the viewpoint is visited at the far end of
            // the sequence, then its axis neighbors, then the near octant's
            // neighbors, then the near octant itself.
            let order = if near_first {
                [cur, cur ^ 1, cur ^ 2, cur ^ 4, far ^ 1, far ^ 2, far ^ 4, far]
            } else {
                [far, far ^ 1, far ^ 2, far ^ 4, cur ^ 1, cur ^ 2, cur ^ 4, cur]
            };
            for idx in order {
                if let Some(child) = children[idx].as_deref_mut() {
                    if let Some(rc) = traverse(child, pos, visit, near_first) {
                        return Some(rc);
                    }
                }
            }
            None
        },
    }
}
