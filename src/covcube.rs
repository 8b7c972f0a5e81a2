//! Six-face perspective coverage cube.
//!
//! Wraps six [`CBuffer`]s around the origin, one per axis direction, so that
//! coverage can be accumulated for *every* direction at once — the coarse
//! occlusion step for omnidirectional queries such as point-light shadow
//! volumes. A world-space polygon is clipped against each face's view
//! pyramid, perspective-projected onto that face, and rasterized into the
//! face's coverage buffer.

use crate::cbuffer::CBuffer;
use crate::float_types::{EPSILON, Real};
use nalgebra::{Point2, Point3, Vector3};

/// Face order: +X, -X, +Y, -Y, +Z, -Z.
const NUM_FACES: usize = 6;

/// Direction and in-face axes per face. The `u`/`v` axes are simply the two
/// remaining coordinate axes; coverage does not care about handedness as
/// long as each face is consistent with itself.
fn face_axes(face: usize) -> (Vector3<Real>, Vector3<Real>, Vector3<Real>) {
    match face {
        0 => (Vector3::x(), Vector3::y(), Vector3::z()),
        1 => (-Vector3::x(), Vector3::y(), Vector3::z()),
        2 => (Vector3::y(), Vector3::x(), Vector3::z()),
        3 => (-Vector3::y(), Vector3::x(), Vector3::z()),
        4 => (Vector3::z(), Vector3::x(), Vector3::y()),
        _ => (-Vector3::z(), Vector3::x(), Vector3::y()),
    }
}

/// A cube of six square coverage buffers centered on the origin.
#[derive(Debug, Clone)]
pub struct CoverageCube {
    faces: Vec<CBuffer>,
    size: usize,
}

impl CoverageCube {
    /// Create a cube whose faces are `size`×`size` coverage buffers.
    pub fn new(size: usize) -> Self {
        let faces = (0..NUM_FACES)
            .map(|_| CBuffer::new(0, size as i32 - 1, size))
            .collect();
        Self { faces, size }
    }

    /// Reset all six faces to fully uncovered.
    pub fn initialize(&mut self) {
        for face in &mut self.faces {
            face.initialize();
        }
    }

    /// True when every face is fully covered.
    pub fn is_full(&self) -> bool {
        self.faces.iter().all(CBuffer::is_full)
    }

    /// The coverage buffer of one face (0..6, order +X −X +Y −Y +Z −Z).
    pub fn face(&self, face: usize) -> &CBuffer {
        &self.faces[face]
    }

    /// True iff the polygon (given in cube-centered world space) covers any
    /// still-uncovered screen on any face. Read-only.
    pub fn test_polygon(&self, verts: &[Point3<Real>]) -> bool {
        for face in 0..NUM_FACES {
            if self.faces[face].is_full() {
                continue;
            }
            if let Some(projected) = self.project_to_face(verts, face) {
                if self.faces[face].test_polygon(&projected) {
                    return true;
                }
            }
        }
        false
    }

    /// Insert the polygon into every face it touches. Returns true iff it
    /// covered anything previously uncovered.
    pub fn insert_polygon(&mut self, verts: &[Point3<Real>]) -> bool {
        let mut visible = false;
        for face in 0..NUM_FACES {
            if let Some(projected) = self.project_to_face(verts, face) {
                visible |= self.faces[face].insert_polygon(&projected);
            }
        }
        visible
    }

    /// Clip the polygon to the face's view pyramid and perspective-project
    /// the result onto the face, in buffer pixel coordinates. `None` when
    /// nothing of the polygon lies inside the pyramid.
    fn project_to_face(
        &self,
        verts: &[Point3<Real>],
        face: usize,
    ) -> Option<Vec<Point2<Real>>> {
        let (dir, u_axis, v_axis) = face_axes(face);

        // The face pyramid is bounded by the four planes |u| <= d and
        // |v| <= d, plus a near plane keeping the perspective divide sane.
        let mut clipped: Vec<Point3<Real>> = verts.to_vec();
        for (normal, min_dot) in [
            (dir, EPSILON),
            (dir - u_axis, 0.0),
            (dir + u_axis, 0.0),
            (dir - v_axis, 0.0),
            (dir + v_axis, 0.0),
        ] {
            clipped = clip_halfspace(&clipped, &normal, min_dot);
            if clipped.len() < 3 {
                return None;
            }
        }

        let scale = (self.size as Real - 1.0) * 0.5;
        let projected = clipped
            .iter()
            .map(|p| {
                let depth = dir.dot(&p.coords);
                let u = u_axis.dot(&p.coords) / depth;
                let v = v_axis.dot(&p.coords) / depth;
                Point2::new((u + 1.0) * scale, (v + 1.0) * scale)
            })
            .collect();
        Some(projected)
    }
}

/// Sutherland-Hodgman clip of a polygon against the half-space
/// `normal · p >= min_dot`.
fn clip_halfspace(
    verts: &[Point3<Real>],
    normal: &Vector3<Real>,
    min_dot: Real,
) -> Vec<Point3<Real>> {
    let mut out = Vec::with_capacity(verts.len() + 2);
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        let da = normal.dot(&a.coords) - min_dot;
        let db = normal.dot(&b.coords) - min_dot;
        if da >= 0.0 {
            out.push(a);
        }
        if (da > 0.0 && db < 0.0) || (da < 0.0 && db > 0.0) {
            let t = da / (da - db);
            out.push(a + (b - a) * t);
        }
    }
    out
}
