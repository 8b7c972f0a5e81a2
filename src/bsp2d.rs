//! 2D Binary Space Partitioning over line segments.
//!
//! Same algorithmic shape as the 3D tree in [`crate::bsp`], specialized to
//! segments split by 2D lines. Used for flattened visibility problems
//! (portal and shadow work) where the scene has already been projected onto
//! a plane. Splitter selection always minimizes splits; segment sets are
//! small enough that an exhaustive candidate scan is fine.

use crate::errors::BuildError;
use crate::float_types::{EPSILON, Real};
use crate::plane::{BACK, COPLANAR, FRONT, SPANNING};
use nalgebra::{Point2, Vector2};
use std::fmt::Debug;

/// A line in 2D space: unit normal plus distance from origin (`n·p = w`).
#[derive(Debug, Clone, PartialEq)]
pub struct Line2 {
    pub normal: Vector2<Real>,
    pub w: Real,
}

impl Line2 {
    /// The supporting line of a segment; the normal is the segment direction
    /// rotated a quarter turn counter-clockwise.
    pub fn from_segment<S: Clone>(segment: &Segment2<S>) -> Self {
        let dir = segment.end - segment.start;
        let normal = Vector2::new(-dir.y, dir.x);
        let norm = normal.norm();
        if norm < EPSILON {
            // Degenerate (zero-length) segment.
            return Self { normal: Vector2::y(), w: segment.start.y };
        }
        let normal = normal / norm;
        Self { w: normal.dot(&segment.start.coords), normal }
    }

    pub fn signed_distance(&self, point: &Point2<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as [`FRONT`], [`BACK`] or [`COPLANAR`].
    pub fn orient_point(&self, point: &Point2<Real>) -> i8 {
        let dist = self.signed_distance(point);
        if dist > EPSILON {
            FRONT
        } else if dist < -EPSILON {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Classify a segment by OR-ing its endpoint classifications.
    pub fn classify_segment<S: Clone>(&self, segment: &Segment2<S>) -> i8 {
        self.orient_point(&segment.start) | self.orient_point(&segment.end)
    }

    /// Split a straddling segment at its intersection with this line,
    /// returning `(front_piece, back_piece)`. Both pieces keep the original
    /// segment's direction.
    pub fn split_segment<S: Clone>(
        &self,
        segment: &Segment2<S>,
    ) -> (Segment2<S>, Segment2<S>) {
        let dir = segment.end - segment.start;
        let denom = self.normal.dot(&dir);
        let t = (self.w - self.normal.dot(&segment.start.coords)) / denom;
        let cut = segment.start + dir * t;
        let first = Segment2 {
            start: segment.start,
            end: cut,
            metadata: segment.metadata.clone(),
        };
        let second = Segment2 {
            start: cut,
            end: segment.end,
            metadata: segment.metadata.clone(),
        };
        if self.orient_point(&segment.start) == FRONT {
            (first, second)
        } else {
            (second, first)
        }
    }
}

/// A 2D line segment with optional caller metadata.
#[derive(Debug, Clone)]
pub struct Segment2<S: Clone> {
    pub start: Point2<Real>,
    pub end: Point2<Real>,
    pub metadata: Option<S>,
}

impl<S: Clone> Segment2<S> {
    pub const fn new(start: Point2<Real>, end: Point2<Real>, metadata: Option<S>) -> Self {
        Self { start, end, metadata }
    }
}

/// A 2D BSP node: a splitting line with front/back subtrees, or a leaf
/// (`line == None`) holding segments that need no further partitioning.
#[derive(Debug, Clone)]
pub struct Bsp2DNode<S: Clone> {
    pub line: Option<Line2>,
    pub front: Option<Box<Bsp2DNode<S>>>,
    pub back: Option<Box<Bsp2DNode<S>>>,
    /// Segments lying exactly on `line` (for a leaf: the residual set).
    pub segments: Vec<Segment2<S>>,
}

impl<S: Clone> Bsp2DNode<S> {
    const fn leaf(segments: Vec<Segment2<S>>) -> Self {
        Self { line: None, front: None, back: None, segments }
    }
}

/// A 2D BSP tree over line segments, with the same viewpoint-ordered
/// traversal and early-abort contract as the 3D tree.
#[derive(Debug, Clone)]
pub struct BspTree2D<S: Clone> {
    root: Bsp2DNode<S>,
}

impl<S: Clone + Debug> BspTree2D<S> {
    pub fn build(segments: Vec<Segment2<S>>) -> Result<Self, BuildError> {
        Ok(Self { root: build_node(segments)? })
    }

    pub const fn root(&self) -> &Bsp2DNode<S> {
        &self.root
    }

    /// Visit all segments back-to-front as seen from `pos`; `Some` from the
    /// visitor aborts the traversal and is returned.
    pub fn back2front<R>(
        &self,
        pos: &Point2<Real>,
        visit: &mut impl FnMut(&[Segment2<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&self.root, pos, visit, false)
    }

    /// Visit all segments front-to-back as seen from `pos`.
    pub fn front2back<R>(
        &self,
        pos: &Point2<Real>,
        visit: &mut impl FnMut(&[Segment2<S>]) -> Option<R>,
    ) -> Option<R> {
        traverse(&self.root, pos, visit, true)
    }

    /// Every segment in the tree, in storage order.
    pub fn all_segments(&self) -> Vec<Segment2<S>> {
        let mut result = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            result.extend_from_slice(&node.segments);
            stack.extend(
                [&node.front, &node.back]
                    .iter()
                    .filter_map(|child| child.as_deref()),
            );
        }
        result
    }
}

fn is_convex<S: Clone>(segments: &[Segment2<S>]) -> bool {
    for (i, a) in segments.iter().enumerate() {
        let line = Line2::from_segment(a);
        for (j, b) in segments.iter().enumerate() {
            if i != j && line.classify_segment(b) == SPANNING {
                return false;
            }
        }
    }
    true
}

/// Minimize-splits candidate scoring: split count alone decides, balance is
/// ignored.
fn pick_splitter<S: Clone>(segments: &[Segment2<S>]) -> usize {
    let mut best_idx = 0;
    let mut best_splits = usize::MAX;
    for (i, candidate) in segments.iter().enumerate() {
        let line = Line2::from_segment(candidate);
        let splits = segments
            .iter()
            .enumerate()
            .filter(|&(j, s)| j != i && line.classify_segment(s) == SPANNING)
            .count();
        if splits < best_splits {
            best_splits = splits;
            best_idx = i;
        }
    }
    best_idx
}

fn build_node<S: Clone + Debug>(
    mut segments: Vec<Segment2<S>>,
) -> Result<Bsp2DNode<S>, BuildError> {
    if segments.len() <= 1 || is_convex(&segments) {
        return Ok(Bsp2DNode::leaf(segments));
    }

    let mut tried = vec![false; segments.len()];
    loop {
        let mut idx = pick_splitter(&segments);
        if tried[idx] {
            match tried.iter().position(|&t| !t) {
                Some(untried) => idx = untried,
                None => {
                    log::warn!(
                        "bsp2d build: no splitter partitions a non-convex set of {} segments, \
                         accepting pseudo-leaf",
                        segments.len()
                    );
                    return Ok(Bsp2DNode::leaf(segments));
                },
            }
        }
        tried[idx] = true;
        let line = Line2::from_segment(&segments[idx]);

        let mut coincident = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        front.try_reserve(segments.len() / 2)?;
        back.try_reserve(segments.len() / 2)?;

        for segment in &segments {
            match line.classify_segment(segment) {
                COPLANAR => coincident.push(segment.clone()),
                FRONT => front.push(segment.clone()),
                BACK => back.push(segment.clone()),
                _ => {
                    let (front_piece, back_piece) = line.split_segment(segment);
                    front.push(front_piece);
                    back.push(back_piece);
                },
            }
        }

        if front.is_empty() && back.is_empty() {
            segments = coincident;
            continue;
        }

        let mut node = Bsp2DNode::leaf(coincident);
        node.line = Some(line);
        if !front.is_empty() {
            node.front = Some(Box::new(build_node(front)?));
        }
        if !back.is_empty() {
            node.back = Some(Box::new(build_node(back)?));
        }
        return Ok(node);
    }
}

fn traverse<S, R, V>(
    node: &Bsp2DNode<S>,
    pos: &Point2<Real>,
    visit: &mut V,
    near_first: bool,
) -> Option<R>
where
    S: Clone,
    V: FnMut(&[Segment2<S>]) -> Option<R>,
{
    let Some(line) = &node.line else {
        if !node.segments.is_empty() {
            return visit(&node.segments);
        }
        return None;
    };

    // A viewpoint exactly on the line counts as front, by convention.
    let viewer_in_front = line.orient_point(pos) != BACK;
    let (first, second) = if viewer_in_front == near_first {
        (&node.front, &node.back)
    } else {
        (&node.back, &node.front)
    };

    if let Some(child) = first.as_deref() {
        if let Some(rc) = traverse(child, pos, visit, near_first) {
            return Some(rc);
        }
    }
    if !node.segments.is_empty() {
        if let Some(rc) = visit(&node.segments) {
            return Some(rc);
        }
    }
    if let Some(child) = second.as_deref() {
        if let Some(rc) = traverse(child, pos, visit, near_first) {
            return Some(rc);
        }
    }
    None
}
