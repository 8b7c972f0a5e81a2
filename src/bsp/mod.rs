//! 3D Binary Space Partitioning tree with viewpoint-ordered traversal.
//!
//! A [`BspTree`] is built once from a polygon set and then walked any number
//! of times in guaranteed back-to-front or front-to-back order relative to a
//! 3D viewpoint (painter's-algorithm rendering, occlusion accumulation). The
//! visitor callback can abort the entire traversal by returning a value,
//! which is propagated unchanged to the original caller.
//!
//! The tree owns every polygon handed to [`BspTree::build`] and every
//! fragment created by splitting; callers keep clones if they need the
//! originals.

pub mod splitter;

pub use splitter::{
    BalancedSplitter, BuildContext, MostOnSplitter, RandomSplitter, SplitterStrategy,
};

use crate::errors::BuildError;
use crate::float_types::Real;
use crate::plane::{BACK, COPLANAR, FRONT, Plane, SPANNING};
use crate::polygon::Polygon;
use nalgebra::Point3;
use std::fmt::Debug;

/// A BSP tree node: a splitting plane with front/back subtrees, or a leaf
/// (`plane == None`) holding a convex residual set.
#[derive(Debug, Clone)]
pub struct BspNode<S: Clone> {
    /// Splitting plane for this node, or `None` for a leaf.
    pub plane: Option<Plane>,

    /// Subtree on the front side of `plane`.
    pub front: Option<Box<BspNode<S>>>,

    /// Subtree on the back side of `plane`.
    pub back: Option<Box<BspNode<S>>>,

    /// Polygons lying exactly on `plane` (for a leaf: the convex residual
    /// set).
    pub polygons: Vec<Polygon<S>>,

    /// Dynamically inserted polygons resolved to this node; visited right
    /// after `polygons`.
    dynamic: Vec<Polygon<S>>,

    /// Queued insertions not yet routed into the subtree. Routed one level
    /// down the first time this node is traversed.
    pending: Vec<Polygon<S>>,
}

impl<S: Clone> BspNode<S> {
    const fn leaf(polygons: Vec<Polygon<S>>) -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons,
            dynamic: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Polygons resolved to this node by dynamic insertion.
    pub fn dynamic_polygons(&self) -> &[Polygon<S>] {
        &self.dynamic
    }
}

/// Tree-shape counters, useful for tuning splitter heuristics and leaf
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BspStatistics {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub total_polygons: usize,
    pub min_polygons_per_node: usize,
    pub max_polygons_per_node: usize,
    /// Leaves accepted without a convexity proof after exhausting every
    /// splitter candidate. Traversal order inside such a leaf is not
    /// guaranteed; a nonzero count deserves investigation.
    pub anomalous_leaves: usize,
}

/// A 3D BSP tree over polygons.
#[derive(Debug, Clone)]
pub struct BspTree<S: Clone> {
    root: BspNode<S>,
    anomalous_leaves: usize,
}

impl<S: Clone + Debug> BspTree<S> {
    /// Build a tree using the default balance/split heuristic.
    pub fn build(
        polygons: Vec<Polygon<S>>,
        ctx: &mut BuildContext,
    ) -> Result<Self, BuildError> {
        Self::build_with_strategy(polygons, &BalancedSplitter::default(), ctx)
    }

    /// Build a tree with an explicit splitter selection strategy.
    pub fn build_with_strategy<SP: SplitterStrategy<S>>(
        polygons: Vec<Polygon<S>>,
        strategy: &SP,
        ctx: &mut BuildContext,
    ) -> Result<Self, BuildError> {
        let mut anomalous_leaves = 0;
        let root = build_node(polygons, strategy, ctx, &mut anomalous_leaves)?;
        let tree = Self { root, anomalous_leaves };
        let stats = tree.statistics();
        log::debug!(
            "built bsp tree: {} nodes, {} leaves, depth {}, {} polygons",
            stats.nodes,
            stats.leaves,
            stats.max_depth,
            stats.total_polygons
        );
        Ok(tree)
    }

    pub const fn root(&self) -> &BspNode<S> {
        &self.root
    }

    /// Queue polygons for lazy insertion. Each queued polygon is routed one
    /// level deeper the first time the corresponding subtree is traversed,
    /// so inserting into a large static tree costs nothing until the region
    /// is actually visited.
    pub fn queue_polygons(&mut self, polygons: Vec<Polygon<S>>) {
        self.root.pending.extend(polygons);
    }

    /// Route every queued insertion all the way down immediately.
    pub fn resolve_all_pending(&mut self) {
        resolve_all(&mut self.root);
    }

    /// Visit all polygons back-to-front as seen from `pos`. The visitor is
    /// called once per non-empty node polygon set; returning `Some` aborts
    /// the traversal and that value is returned.
    pub fn back2front<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, &mut |_, _| true, Order::BackToFront)
    }

    /// Visit all polygons front-to-back as seen from `pos`.
    pub fn front2back<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, &mut |_, _| true, Order::FrontToBack)
    }

    /// [`Self::back2front`] with a node culler: a subtree whose root fails
    /// `cull` is skipped entirely.
    pub fn back2front_with_cull<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
        cull: &mut impl FnMut(&BspNode<S>, &Point3<Real>) -> bool,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, cull, Order::BackToFront)
    }

    /// [`Self::front2back`] with a node culler.
    pub fn front2back_with_cull<R>(
        &mut self,
        pos: &Point3<Real>,
        visit: &mut impl FnMut(&[Polygon<S>]) -> Option<R>,
        cull: &mut impl FnMut(&BspNode<S>, &Point3<Real>) -> bool,
    ) -> Option<R> {
        traverse(&mut self.root, pos, visit, cull, Order::FrontToBack)
    }

    /// Every polygon in the tree, in storage order.
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            result.extend_from_slice(&node.polygons);
            result.extend_from_slice(&node.dynamic);
            stack.extend(
                [&node.front, &node.back]
                    .iter()
                    .filter_map(|child| child.as_deref()),
            );
        }
        result
    }

    pub fn statistics(&self) -> BspStatistics {
        let mut stats = BspStatistics {
            min_polygons_per_node: usize::MAX,
            anomalous_leaves: self.anomalous_leaves,
            ..BspStatistics::default()
        };
        collect_stats(&self.root, 1, &mut stats);
        if stats.min_polygons_per_node == usize::MAX {
            stats.min_polygons_per_node = 0;
        }
        stats
    }
}

fn collect_stats<S: Clone>(node: &BspNode<S>, depth: usize, stats: &mut BspStatistics) {
    stats.nodes += 1;
    if node.plane.is_none() {
        stats.leaves += 1;
    }
    stats.max_depth = stats.max_depth.max(depth);
    let count = node.polygons.len() + node.dynamic.len();
    stats.total_polygons += count;
    stats.min_polygons_per_node = stats.min_polygons_per_node.min(count);
    stats.max_polygons_per_node = stats.max_polygons_per_node.max(count);
    if let Some(front) = &node.front {
        collect_stats(front, depth + 1, stats);
    }
    if let Some(back) = &node.back {
        collect_stats(back, depth + 1, stats);
    }
}

/// A set is convex (needs no further partitioning) when no polygon's plane
/// slices any other polygon in the set.
fn is_convex<S: Clone>(polygons: &[Polygon<S>]) -> bool {
    for (i, a) in polygons.iter().enumerate() {
        for (j, b) in polygons.iter().enumerate() {
            if i != j && a.plane.classify_polygon(b) == SPANNING {
                return false;
            }
        }
    }
    true
}

fn build_node<S: Clone + Debug, SP: SplitterStrategy<S>>(
    mut polygons: Vec<Polygon<S>>,
    strategy: &SP,
    ctx: &mut BuildContext,
    anomalous_leaves: &mut usize,
) -> Result<BspNode<S>, BuildError> {
    if polygons.len() <= 1 || is_convex(&polygons) {
        return Ok(BspNode::leaf(polygons));
    }

    let mut tried = vec![false; polygons.len()];
    loop {
        let mut idx = strategy.pick(&polygons, ctx);
        if tried[idx] {
            // Strategy re-picked an exhausted candidate; take the first
            // untried one instead.
            match tried.iter().position(|&t| !t) {
                Some(untried) => idx = untried,
                None => {
                    // Every polygon has been tried as a splitter and the set
                    // still is not provably convex. Accept it as a leaf so
                    // the build terminates; traversal order inside this leaf
                    // is no longer guaranteed.
                    *anomalous_leaves += 1;
                    log::warn!(
                        "bsp build: no splitter partitions a non-convex set of {} polygons, \
                         accepting pseudo-leaf",
                        polygons.len()
                    );
                    return Ok(BspNode::leaf(polygons));
                },
            }
        }
        tried[idx] = true;
        let plane = polygons[idx].plane.clone();

        let mut coplanar = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        front.try_reserve(polygons.len() / 2)?;
        back.try_reserve(polygons.len() / 2)?;

        for polygon in &polygons {
            let (coplanar_front, coplanar_back, mut front_parts, mut back_parts) =
                plane.split_polygon(polygon);
            coplanar.extend(coplanar_front);
            coplanar.extend(coplanar_back);
            front.append(&mut front_parts);
            back.append(&mut back_parts);
        }

        if front.is_empty() && back.is_empty() {
            // The candidate plane separated nothing; everything is coplanar
            // with it. Put the set back together and try another splitter.
            polygons = coplanar;
            continue;
        }

        let mut node = BspNode::leaf(coplanar);
        node.plane = Some(plane);
        if !front.is_empty() {
            node.front =
                Some(Box::new(build_node(front, strategy, ctx, anomalous_leaves)?));
        }
        if !back.is_empty() {
            node.back =
                Some(Box::new(build_node(back, strategy, ctx, anomalous_leaves)?));
        }
        return Ok(node);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    BackToFront,
    FrontToBack,
}

/// Route this node's queued insertions one level down. Coplanar polygons
/// (and anything arriving at a leaf) become node-resident dynamic polygons;
/// the rest lands in the children's pending lists, materializing empty leaf
/// children where needed.
fn resolve_pending<S: Clone + Debug>(node: &mut BspNode<S>) {
    if node.pending.is_empty() {
        return;
    }
    let pending = std::mem::take(&mut node.pending);
    let Some(plane) = node.plane.clone() else {
        node.dynamic.extend(pending);
        return;
    };
    for polygon in pending {
        match plane.classify_polygon(&polygon) {
            COPLANAR => node.dynamic.push(polygon),
            FRONT => node
                .front
                .get_or_insert_with(|| Box::new(BspNode::leaf(Vec::new())))
                .pending
                .push(polygon),
            BACK => node
                .back
                .get_or_insert_with(|| Box::new(BspNode::leaf(Vec::new())))
                .pending
                .push(polygon),
            _ => {
                let (coplanar_front, coplanar_back, front_parts, back_parts) =
                    plane.split_polygon(&polygon);
                node.dynamic.extend(coplanar_front);
                node.dynamic.extend(coplanar_back);
                if !front_parts.is_empty() {
                    node.front
                        .get_or_insert_with(|| Box::new(BspNode::leaf(Vec::new())))
                        .pending
                        .extend(front_parts);
                }
                if !back_parts.is_empty() {
                    node.back
                        .get_or_insert_with(|| Box::new(BspNode::leaf(Vec::new())))
                        .pending
                        .extend(back_parts);
                }
            },
        }
    }
}

fn resolve_all<S: Clone + Debug>(node: &mut BspNode<S>) {
    resolve_pending(node);
    if let Some(front) = node.front.as_deref_mut() {
        resolve_all(front);
    }
    if let Some(back) = node.back.as_deref_mut() {
        resolve_all(back);
    }
}

fn traverse<S, R, V, C>(
    node: &mut BspNode<S>,
    pos: &Point3<Real>,
    visit: &mut V,
    cull: &mut C,
    order: Order,
) -> Option<R>
where
    S: Clone + Debug,
    V: FnMut(&[Polygon<S>]) -> Option<R>,
    C: FnMut(&BspNode<S>, &Point3<Real>) -> bool,
{
    if !cull(node, pos) {
        return None;
    }
    resolve_pending(node);

    let Some(plane) = node.plane.clone() else {
        if !node.polygons.is_empty() {
            if let Some(rc) = visit(&node.polygons) {
                return Some(rc);
            }
        }
        if !node.dynamic.is_empty() {
            if let Some(rc) = visit(&node.dynamic) {
                return Some(rc);
            }
        }
        return None;
    };

    // A viewpoint exactly on the plane counts as front, by convention.
    let viewer_in_front = plane.orient_point(pos) != BACK;

    // Back-to-front from the front side means: far (back) subtree, then the
    // node's own polygons, then the near (front) subtree. Every other case
    // mirrors or reverses that pair.
    let near_first = matches!(order, Order::FrontToBack);
    let (first, second) = if viewer_in_front == near_first {
        (&mut node.front, &mut node.back)
    } else {
        (&mut node.back, &mut node.front)
    };

    if let Some(child) = first.as_deref_mut() {
        if let Some(rc) = traverse(child, pos, visit, cull, order) {
            return Some(rc);
        }
    }
    if !node.polygons.is_empty() {
        if let Some(rc) = visit(&node.polygons) {
            return Some(rc);
        }
    }
    if !node.dynamic.is_empty() {
        if let Some(rc) = visit(&node.dynamic) {
            return Some(rc);
        }
    }
    if let Some(child) = second.as_deref_mut() {
        if let Some(rc) = traverse(child, pos, visit, cull, order) {
            return Some(rc);
        }
    }
    None
}
