//! Scanline coverage buffer (C-buffer).
//!
//! Tracks, per scanline, the columns *not yet covered* by anything drawn so
//! far, as a sorted list of disjoint inclusive intervals. Front-to-back
//! renderers insert each drawn polygon and stop as soon as the buffer reports
//! full coverage; occlusion cullers test a polygon's silhouette without
//! drawing it. "Not visible" and "nothing changed" are ordinary boolean
//! results here, never errors.

use crate::float_types::{EPSILON, Real};
use nalgebra::Point2;

/// An inclusive column interval `[start, end]` of uncovered screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: i32,
    end: i32,
}

/// A scanline coverage buffer over columns `[startx, endx]` (inclusive) and
/// `num_lines` scanlines.
#[derive(Debug, Clone)]
pub struct CBuffer {
    startx: i32,
    endx: i32,
    /// Per-scanline uncovered intervals, sorted and disjoint. An empty list
    /// means the line is fully covered. The vectors keep their capacity
    /// across [`Self::initialize`] calls, so a render frame does not churn
    /// the allocator.
    lines: Vec<Vec<Interval>>,
    /// Lines not yet fully covered; 0 means the whole buffer is covered and
    /// every further test can early-out.
    not_full_lines: usize,
}

impl CBuffer {
    /// Create a buffer covering columns `startx..=endx` on `num_lines`
    /// scanlines, initially fully uncovered.
    pub fn new(startx: i32, endx: i32, num_lines: usize) -> Self {
        let mut buffer = Self {
            startx,
            endx,
            lines: vec![Vec::with_capacity(4); num_lines],
            not_full_lines: 0,
        };
        buffer.initialize();
        buffer
    }

    /// Reset every line to fully uncovered.
    pub fn initialize(&mut self) {
        for line in &mut self.lines {
            line.clear();
            line.push(Interval { start: self.startx, end: self.endx });
        }
        self.not_full_lines = self.lines.len();
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub const fn range(&self) -> (i32, i32) {
        (self.startx, self.endx)
    }

    /// True when no uncovered column remains anywhere in the buffer.
    pub const fn is_full(&self) -> bool {
        self.not_full_lines == 0
    }

    /// True when scanline `y` is fully covered.
    pub fn line_full(&self, y: i32) -> bool {
        self.line(y).is_none_or(|line| line.is_empty())
    }

    fn line(&self, y: i32) -> Option<&Vec<Interval>> {
        usize::try_from(y).ok().and_then(|y| self.lines.get(y))
    }

    /// True iff any part of `[startx, endx]` on line `y` is still uncovered.
    /// Read-only.
    pub fn test_span(&self, startx: i32, endx: i32, y: i32) -> bool {
        let sx = startx.max(self.startx);
        let ex = endx.min(self.endx);
        if sx > ex {
            return false;
        }
        let Some(line) = self.line(y) else {
            return false;
        };
        line.iter().any(|iv| iv.end >= sx && iv.start <= ex)
    }

    /// Mark `[startx, endx]` on line `y` as covered. Returns true iff the
    /// span was at least partly uncovered before the call (i.e. something
    /// changed).
    pub fn insert_span(&mut self, startx: i32, endx: i32, y: i32) -> bool {
        let sx = startx.max(self.startx);
        let ex = endx.min(self.endx);
        if sx > ex {
            return false;
        }
        let Some(line) = usize::try_from(y).ok().and_then(|y| self.lines.get_mut(y))
        else {
            return false;
        };
        if line.is_empty() {
            return false;
        }

        let mut changed = false;
        let mut i = 0;
        while i < line.len() {
            let iv = line[i];
            if iv.end < sx {
                i += 1;
                continue;
            }
            if iv.start > ex {
                break;
            }
            changed = true;
            if iv.start < sx && iv.end > ex {
                // Span strictly inside the interval: split it in two.
                line[i].end = sx - 1;
                line.insert(i + 1, Interval { start: ex + 1, end: iv.end });
                break;
            } else if iv.start < sx {
                // Overlaps the interval's right edge: shrink it.
                line[i].end = sx - 1;
                i += 1;
            } else if iv.end > ex {
                // Overlaps the interval's left edge: shrink it.
                line[i].start = ex + 1;
                break;
            } else {
                // Interval fully covered: drop it.
                line.remove(i);
            }
        }

        if changed && line.is_empty() {
            self.not_full_lines -= 1;
        }
        changed
    }

    /// True iff any scanline of the rasterized polygon silhouette overlaps
    /// uncovered screen. Read-only; degenerate polygons (fewer than 3
    /// distinct vertices) are not visible.
    pub fn test_polygon(&self, verts: &[Point2<Real>]) -> bool {
        if self.is_full() {
            return false;
        }
        let Some((y_top, spans)) = rasterize(verts, self.lines.len()) else {
            return false;
        };
        spans
            .iter()
            .enumerate()
            .any(|(i, &(sx, ex))| self.test_span(sx, ex, y_top + i as i32))
    }

    /// Insert the rasterized polygon silhouette. Returns true iff any part
    /// of it was uncovered before insertion.
    pub fn insert_polygon(&mut self, verts: &[Point2<Real>]) -> bool {
        if self.is_full() {
            return false;
        }
        let Some((y_top, spans)) = rasterize(verts, self.lines.len()) else {
            return false;
        };
        let mut visible = false;
        for (i, &(sx, ex)) in spans.iter().enumerate() {
            // No early out: every scanline must be inserted.
            visible |= self.insert_span(sx, ex, y_top + i as i32);
        }
        visible
    }
}

/// Rasterize a polygon silhouette into per-scanline column spans using an
/// incremental edge walk: each non-horizontal edge is advanced one scanline
/// at a time (`x += dx`, with a correction for the first partial scanline)
/// and widens the min/max column bounds of the lines it crosses. Fractional
/// span ends round toward the polygon interior.
///
/// Returns the top scanline and one `(startx, endx)` span per line, or
/// `None` for degenerate input.
fn rasterize(verts: &[Point2<Real>], num_lines: usize) -> Option<(i32, Vec<(i32, i32)>)> {
    // Merge near-duplicate vertices first; a polygon needs at least 3
    // distinct corners to cover anything.
    let mut distinct: Vec<Point2<Real>> = Vec::with_capacity(verts.len());
    for v in verts {
        if distinct
            .last()
            .is_none_or(|prev| (v - prev).norm() > EPSILON)
        {
            distinct.push(*v);
        }
    }
    while distinct.len() > 1
        && (distinct[0] - distinct[distinct.len() - 1]).norm() <= EPSILON
    {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return None;
    }

    let y_min = distinct.iter().map(|v| v.y).fold(Real::MAX, Real::min);
    let y_max = distinct.iter().map(|v| v.y).fold(Real::MIN, Real::max);
    let y_top = (y_min.ceil() as i32).max(0);
    let y_bot = (y_max.floor() as i32).min(num_lines as i32 - 1);
    if y_bot < y_top {
        return None;
    }

    let height = (y_bot - y_top + 1) as usize;
    let mut x_min = vec![Real::MAX; height];
    let mut x_max = vec![Real::MIN; height];

    for i in 0..distinct.len() {
        let a = distinct[i];
        let b = distinct[(i + 1) % distinct.len()];
        if (a.y - b.y).abs() <= EPSILON {
            // Horizontal edge: contributes only where its own scanline is.
            let y = a.y.round();
            if (a.y - y).abs() <= EPSILON {
                let y = y as i32;
                if y >= y_top && y <= y_bot {
                    let row = (y - y_top) as usize;
                    x_min[row] = x_min[row].min(a.x.min(b.x));
                    x_max[row] = x_max[row].max(a.x.max(b.x));
                }
            }
            continue;
        }
        let (top, bot) = if a.y < b.y { (a, b) } else { (b, a) };
        let dx = (bot.x - top.x) / (bot.y - top.y);
        let ey0 = (top.y.ceil() as i32).max(y_top);
        let ey1 = (bot.y.floor() as i32).min(y_bot);
        if ey1 < ey0 {
            continue;
        }
        // First partial scanline correction.
        let mut x = top.x + dx * (ey0 as Real - top.y);
        for y in ey0..=ey1 {
            let row = (y - y_top) as usize;
            x_min[row] = x_min[row].min(x);
            x_max[row] = x_max[row].max(x);
            x += dx;
        }
    }

    // Span ends shrink inward: a column counts only when the silhouette
    // reaches across it, so inserting a polygon never covers screen the
    // polygon does not. Slivers narrower than one column become empty spans.
    let spans = x_min
        .iter()
        .zip(&x_max)
        .map(|(&lo, &hi)| {
            if lo > hi {
                // Scanline not touched by any edge; empty span.
                (1, 0)
            } else {
                (lo.ceil() as i32, hi.floor() as i32)
            }
        })
        .collect();
    Some((y_top, spans))
}
