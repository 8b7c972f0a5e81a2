//! Oriented-bounding-box hierarchy over triangles, for collision queries.
//!
//! A separate, simpler tree than the visibility structures: no traversal
//! order contract, just a covariance-driven recursive build. Each node's
//! orientation comes from the eigenvectors of the area-weighted covariance
//! of its triangle set (largest eigenvalue first); the set is partitioned by
//! projecting triangle centroids onto the primary axis. Single-triangle
//! leaves orient directly from the triangle's edge geometry.
//!
//! Nearest/overlap queries against the finished tree are the embedding
//! engine's business; the node tree is fully public for that purpose.

use crate::errors::BuildError;
use crate::float_types::{EPSILON, Real};
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// A triangle in the collision mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionTriangle {
    pub a: Point3<Real>,
    pub b: Point3<Real>,
    pub c: Point3<Real>,
}

impl CollisionTriangle {
    pub const fn new(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>) -> Self {
        Self { a, b, c }
    }

    pub fn area(&self) -> Real {
        (self.b - self.a).cross(&(self.c - self.a)).norm() * 0.5
    }

    pub fn centroid(&self) -> Point3<Real> {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }
}

#[derive(Debug, Clone)]
enum ObbNodeKind {
    /// Exactly two children.
    Branch(Box<[ObbNode; 2]>),
    /// Index of the single triangle this leaf holds.
    Leaf(usize),
}

/// One oriented box in the hierarchy.
#[derive(Debug, Clone)]
pub struct ObbNode {
    /// Box center in world space.
    pub center: Point3<Real>,
    /// Box axes as matrix columns: primary, secondary, tertiary.
    pub orientation: Matrix3<Real>,
    /// Half-extent along each box axis.
    pub half_extents: Vector3<Real>,
    kind: ObbNodeKind,
}

impl ObbNode {
    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, ObbNodeKind::Leaf(_))
    }

    /// The two children of a branch node.
    pub fn children(&self) -> Option<(&Self, &Self)> {
        match &self.kind {
            ObbNodeKind::Branch(pair) => Some((&pair[0], &pair[1])),
            ObbNodeKind::Leaf(_) => None,
        }
    }

    /// The triangle index held by a leaf node.
    pub const fn triangle_index(&self) -> Option<usize> {
        match self.kind {
            ObbNodeKind::Leaf(idx) => Some(idx),
            ObbNodeKind::Branch(_) => None,
        }
    }
}

/// An oriented-bounding-box tree over a triangle set.
#[derive(Debug, Clone)]
pub struct ObbTree {
    root: Option<ObbNode>,
    triangles: Vec<CollisionTriangle>,
}

impl ObbTree {
    /// Build a hierarchy over `triangles`. An empty input yields a tree with
    /// no root; degenerate (zero-area) triangles are weighted by the
    /// smallest nonzero area observed so the moment accumulation never goes
    /// singular.
    pub fn build(triangles: Vec<CollisionTriangle>) -> Result<Self, BuildError> {
        if triangles.is_empty() {
            return Ok(Self { root: None, triangles });
        }

        let mut areas = Vec::new();
        areas.try_reserve(triangles.len())?;
        areas.extend(triangles.iter().map(CollisionTriangle::area));
        let min_nonzero = areas
            .iter()
            .copied()
            .filter(|&a| a > 0.0)
            .fold(Real::MAX, Real::min);
        let fallback = if min_nonzero == Real::MAX { 1.0 } else { min_nonzero };
        for area in &mut areas {
            if *area <= 0.0 {
                *area = fallback;
            }
        }

        let indices: Vec<usize> = (0..triangles.len()).collect();
        let root = build_node(&triangles, &areas, indices);
        Ok(Self { root: Some(root), triangles })
    }

    pub const fn root(&self) -> Option<&ObbNode> {
        self.root.as_ref()
    }

    pub fn triangles(&self) -> &[CollisionTriangle] {
        &self.triangles
    }
}

/// Area-weighted mean point and covariance of a triangle subset, RAPID-style
/// second-moment accumulation.
fn moments(
    triangles: &[CollisionTriangle],
    areas: &[Real],
    indices: &[usize],
) -> (Vector3<Real>, Matrix3<Real>) {
    let mut total_weight = 0.0;
    let mut mean = Vector3::zeros();
    let mut second = Matrix3::zeros();
    for &i in indices {
        let tri = &triangles[i];
        let w = areas[i];
        let m = tri.centroid().coords;
        total_weight += w;
        mean += m * w;
        let (a, b, c) = (tri.a.coords, tri.b.coords, tri.c.coords);
        second += (m * m.transpose() * 9.0
            + a * a.transpose()
            + b * b.transpose()
            + c * c.transpose())
            * (w / 12.0);
    }
    mean /= total_weight;
    let covariance = second - mean * mean.transpose() * total_weight;
    (mean, covariance)
}

/// Box orientation from the covariance eigenvectors, sorted by descending
/// eigenvalue. A decomposition that comes back non-finite (fully degenerate
/// input) falls back to the identity frame; partition quality degrades but
/// the build completes.
fn orientation_from_covariance(covariance: &Matrix3<Real>) -> Matrix3<Real> {
    let eigen = SymmetricEigen::new(*covariance);
    if eigen.eigenvalues.iter().any(|v| !v.is_finite())
        || eigen.eigenvectors.iter().any(|v| !v.is_finite())
    {
        return Matrix3::identity();
    }
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| {
        eigen.eigenvalues[j]
            .partial_cmp(&eigen.eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ])
}

/// Orientation for a single-triangle leaf: longest edge is the primary axis,
/// the face normal the tertiary, their cross product the secondary.
fn orientation_from_triangle(tri: &CollisionTriangle) -> Matrix3<Real> {
    let edges = [tri.b - tri.a, tri.c - tri.b, tri.a - tri.c];
    let longest = edges
        .iter()
        .max_by(|a, b| {
            a.norm_squared()
                .partial_cmp(&b.norm_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
        .unwrap_or_else(Vector3::x);
    let normal = (tri.b - tri.a).cross(&(tri.c - tri.a));
    if longest.norm_squared() < EPSILON * EPSILON || normal.norm_squared() < EPSILON * EPSILON
    {
        return Matrix3::identity();
    }
    let primary = longest.normalize();
    let tertiary = normal.normalize();
    let secondary = tertiary.cross(&primary);
    Matrix3::from_columns(&[primary, secondary, tertiary])
}

/// Center and half-extents of the box with axes `orientation` that encloses
/// every vertex of the member triangles: project all vertices onto the box's
/// own axes and take per-axis min/max.
fn fit_box(
    triangles: &[CollisionTriangle],
    indices: &[usize],
    orientation: &Matrix3<Real>,
) -> (Point3<Real>, Vector3<Real>) {
    let mut lo = Vector3::repeat(Real::MAX);
    let mut hi = Vector3::repeat(Real::MIN);
    for &i in indices {
        let tri = &triangles[i];
        for p in [&tri.a, &tri.b, &tri.c] {
            let local = orientation.transpose() * p.coords;
            lo = lo.inf(&local);
            hi = hi.sup(&local);
        }
    }
    let center_local = (lo + hi) * 0.5;
    let center = Point3::from(orientation * center_local);
    let half_extents = (hi - lo) * 0.5;
    (center, half_extents)
}

fn build_node(
    triangles: &[CollisionTriangle],
    areas: &[Real],
    indices: Vec<usize>,
) -> ObbNode {
    if indices.len() == 1 {
        let idx = indices[0];
        let orientation = orientation_from_triangle(&triangles[idx]);
        let (center, half_extents) = fit_box(triangles, &indices, &orientation);
        return ObbNode {
            center,
            orientation,
            half_extents,
            kind: ObbNodeKind::Leaf(idx),
        };
    }

    let (mean, covariance) = moments(triangles, areas, &indices);
    let orientation = orientation_from_covariance(&covariance);
    let (center, half_extents) = fit_box(triangles, &indices, &orientation);

    let (below, above) = if indices.len() == 2 {
        // Trusting the projection here can put both triangles in one group;
        // force an even split.
        (vec![indices[0]], vec![indices[1]])
    } else {
        let primary = orientation.column(0);
        let mean_proj = primary.dot(&mean);
        let (below, above): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| primary.dot(&triangles[i].centroid().coords) <= mean_proj);
        if below.is_empty() || above.is_empty() {
            // Degenerate partition (all centroids project together); fall
            // back to an even split by index.
            let mid = indices.len() / 2;
            (indices[..mid].to_vec(), indices[mid..].to_vec())
        } else {
            (below, above)
        }
    };

    let children = Box::new([
        build_node(triangles, areas, below),
        build_node(triangles, areas, above),
    ]);
    ObbNode {
        center,
        orientation,
        half_extents,
        kind: ObbNodeKind::Branch(children),
    }
}
