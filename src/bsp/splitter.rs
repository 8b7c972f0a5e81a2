//! Splitter selection heuristics for the 3D BSP tree.
//!
//! Picking the splitting plane is the whole ballgame for BSP quality: a bad
//! splitter either fragments polygons (splits) or produces lopsided trees
//! (balance). The strategies here trade those two penalties off in different
//! ways; all of them are deterministic given the same [`BuildContext`] seed.

use crate::float_types::Real;
use crate::plane::{BACK, COPLANAR, FRONT};
use crate::polygon::Polygon;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;

/// Mutable state threaded through a tree build. Owns the RNG so that random
/// splitter choice and candidate sampling never rely on ambient global state;
/// seed it for reproducible trees.
#[derive(Debug)]
pub struct BuildContext {
    pub(crate) rng: StdRng,
}

impl BuildContext {
    /// Context with an OS-seeded RNG.
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Context with a fixed seed; two builds from the same seed and input
    /// produce identical trees.
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for picking the splitter polygon at a BSP node. Returns an index
/// into `polygons`; the chosen polygon's plane becomes the node's splitting
/// plane.
pub trait SplitterStrategy<S: Clone> {
    fn pick(&self, polygons: &[Polygon<S>], ctx: &mut BuildContext) -> usize;
}

/// Pick any remaining polygon uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSplitter;

impl<S: Clone> SplitterStrategy<S> for RandomSplitter {
    fn pick(&self, polygons: &[Polygon<S>], ctx: &mut BuildContext) -> usize {
        ctx.rng.random_range(0..polygons.len())
    }
}

/// Pick the polygon whose plane is shared (within tolerance) by the most
/// other polygons. Tends to produce large flat leaf groups, e.g. floors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostOnSplitter;

impl<S: Clone> SplitterStrategy<S> for MostOnSplitter {
    fn pick(&self, polygons: &[Polygon<S>], _ctx: &mut BuildContext) -> usize {
        let mut best_idx = 0;
        let mut best_count = 0;
        for (i, candidate) in polygons.iter().enumerate() {
            let count = polygons
                .iter()
                .enumerate()
                .filter(|&(j, p)| j != i && p.plane.near_equal(&candidate.plane))
                .count();
            if count > best_count {
                best_count = count;
                best_idx = i;
            }
        }
        best_idx
    }
}

/// Weighted balance/split penalty heuristic.
///
/// For each candidate splitter every other polygon is classified against its
/// plane; the candidate minimizing
/// `balance_weight * |front + split - back| / n  +  split_weight * split / n`
/// wins. With `sample_cap` set, only that many randomly drawn candidates are
/// scored instead of all of them, bounding build cost on large inputs.
#[derive(Debug, Clone, Copy)]
pub struct BalancedSplitter {
    pub balance_weight: Real,
    pub split_weight: Real,
    pub sample_cap: Option<usize>,
}

impl BalancedSplitter {
    /// Bound used by [`Self::sampled`] when no explicit cap is given.
    pub const DEFAULT_SAMPLE_CAP: usize = 20;

    /// Mostly balance, splits weighted lightly.
    pub const fn balanced() -> Self {
        Self { balance_weight: 1.0, split_weight: 0.1, sample_cap: None }
    }

    /// Ignore balance entirely, minimize split count.
    pub const fn minimize_splits() -> Self {
        Self { balance_weight: 0.0, split_weight: 1.0, sample_cap: None }
    }

    /// Score only a bounded random subset of candidates.
    pub const fn sampled(mut self) -> Self {
        self.sample_cap = Some(Self::DEFAULT_SAMPLE_CAP);
        self
    }

    pub const fn with_sample_cap(mut self, cap: usize) -> Self {
        self.sample_cap = Some(cap);
        self
    }

    fn score<S: Clone>(&self, polygons: &[Polygon<S>], candidate: usize) -> Real {
        let plane = &polygons[candidate].plane;
        let mut front = 0usize;
        let mut back = 0usize;
        let mut split = 0usize;
        for (j, poly) in polygons.iter().enumerate() {
            if j == candidate {
                continue;
            }
            match plane.classify_polygon(poly) {
                COPLANAR => {},
                FRONT => front += 1,
                BACK => back += 1,
                _ => split += 1,
            }
        }
        let total = polygons.len() as Real;
        let balance_penalty =
            ((front + split) as Real - back as Real).abs() / total;
        let split_penalty = split as Real / total;
        self.balance_weight * balance_penalty + self.split_weight * split_penalty
    }
}

impl Default for BalancedSplitter {
    /// Default weighting: balance 1, splits 4.
    fn default() -> Self {
        Self { balance_weight: 1.0, split_weight: 4.0, sample_cap: None }
    }
}

impl<S: Clone + Debug> SplitterStrategy<S> for BalancedSplitter {
    fn pick(&self, polygons: &[Polygon<S>], ctx: &mut BuildContext) -> usize {
        let mut best_idx = 0;
        let mut best_score = Real::MAX;
        match self.sample_cap {
            Some(cap) if polygons.len() > cap => {
                for _ in 0..cap {
                    let i = ctx.rng.random_range(0..polygons.len());
                    let score = self.score(polygons, i);
                    if score < best_score {
                        best_score = score;
                        best_idx = i;
                    }
                }
            },
            _ => {
                for i in 0..polygons.len() {
                    let score = self.score(polygons, i);
                    if score < best_score {
                        best_score = score;
                        best_idx = i;
                    }
                }
            },
        }
        best_idx
    }
}
