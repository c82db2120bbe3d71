//! Top-down schedule optimization.
//!
//! Every innermost band is optimized at most once, by the first strategy
//! that applies:
//!
//! 1. a matrix-multiply band becomes a register-blocked micro-kernel;
//! 2. otherwise the permutable members are tiled at every enabled level,
//! 3. and the innermost coincident member is prevectorized.
//!
//! Rewritten subtrees are not visited again, and the marks placed above
//! point and vector loops stop later runs from tiling them twice.

use schedule_tree::{Band, Schedule, ScheduleNode, WalkAction};

use crate::access_pattern::match_matmul;
use crate::ascend_to;
use crate::classify::{is_tileable, vector_dimension};
use crate::config::{OptimizerConfig, TilingLevel};
use crate::cost::{CostModel, TargetCostModel};
use crate::matmul_kernel::build_kernel;
use crate::profitability::is_profitable;
use crate::tiling::{apply_register_tiling, tile};
use crate::vectorize::{SIMD_MARK, prevectorize};

/// What a run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Bands tiled at one or more levels.
    pub bands_tiled: usize,
    pub bands_prevectorized: usize,
    pub matmul_kernels: usize,
}

impl OptimizeStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of optimizing a whole schedule.
#[derive(Debug)]
pub struct OptimizeResult {
    /// The optimized schedule, or the input when the rewrite was rejected.
    pub schedule: Schedule,
    pub stats: OptimizeStats,
    /// Whether the profitability check kept the rewrite.
    pub accepted: bool,
}

/// Optimize a whole schedule using the default configuration.
pub fn optimize_schedule(schedule: Schedule, cost: Option<&dyn CostModel>) -> OptimizeResult {
    optimize_schedule_with_config(schedule, cost, &OptimizerConfig::default())
}

/// Optimize a whole schedule, keeping the result only if it is profitable.
pub fn optimize_schedule_with_config(
    schedule: Schedule,
    cost: Option<&dyn CostModel>,
    config: &OptimizerConfig,
) -> OptimizeResult {
    let original = schedule.clone();
    let mut optimizer = BandOptimizer::new(config, cost);
    let candidate = optimizer.run(schedule.into_root()).into_schedule();
    let stats = optimizer.stats;

    let accepted = is_profitable(&original, &candidate);
    tracing::info!(
        tiled = stats.bands_tiled,
        prevectorized = stats.bands_prevectorized,
        matmul_kernels = stats.matmul_kernels,
        accepted,
        "schedule optimized"
    );
    OptimizeResult {
        schedule: if accepted { candidate } else { original },
        stats,
        accepted,
    }
}

/// Optimize the subtree under `node` using the default configuration.
pub fn optimize_schedule_node(node: ScheduleNode, cost: Option<&dyn CostModel>) -> ScheduleNode {
    optimize_schedule_node_with_config(node, cost, &OptimizerConfig::default())
}

/// Optimize the subtree under `node` without a profitability check. The
/// cursor stays at the same position.
pub fn optimize_schedule_node_with_config(
    node: ScheduleNode,
    cost: Option<&dyn CostModel>,
    config: &OptimizerConfig,
) -> ScheduleNode {
    BandOptimizer::new(config, cost).run(node)
}

fn is_optimizer_mark(tag: &str) -> bool {
    tag == SIMD_MARK || tag.ends_with(" - Points")
}

struct BandOptimizer<'a> {
    config: &'a OptimizerConfig,
    cost: Option<&'a dyn CostModel>,
    stats: OptimizeStats,
}

impl<'a> BandOptimizer<'a> {
    fn new(config: &'a OptimizerConfig, cost: Option<&'a dyn CostModel>) -> Self {
        Self {
            config,
            cost,
            stats: OptimizeStats::default(),
        }
    }

    fn run(&mut self, node: ScheduleNode) -> ScheduleNode {
        node.map_descendants(|node| self.visit(node))
    }

    fn visit(&mut self, node: ScheduleNode) -> (ScheduleNode, WalkAction) {
        if node.node().as_mark().is_some_and(is_optimizer_mark) {
            return (node, WalkAction::Skip);
        }
        if !is_tileable(&node) {
            return (node, WalkAction::Advance);
        }
        let (node, changed) = self.optimize_band(node);
        let action = if changed {
            WalkAction::Skip
        } else {
            WalkAction::Advance
        };
        (node, action)
    }

    fn vector_width(&self) -> i64 {
        self.cost
            .map_or(self.config.prevector_width, |cost| cost.vector_width())
    }

    /// Apply the first applicable strategy. Returns the cursor at the band's
    /// position and whether anything changed.
    fn optimize_band(&mut self, node: ScheduleNode) -> (ScheduleNode, bool) {
        let depth = node.path().len();

        if self.config.pattern_matching && node.band().is_some_and(Band::is_permutable) {
            if let Some(candidate) = match_matmul(&node) {
                let default_target = TargetCostModel::default();
                let cost: &dyn CostModel = match self.cost {
                    Some(cost) => cost,
                    None => &default_target,
                };
                let node = build_kernel(node, &candidate, cost);
                self.stats.matmul_kernels += 1;
                return (ascend_to(node, depth), true);
            }
        }

        let Some(band) = node.band() else {
            return (node, false);
        };
        let n = band.n_member();
        let permutable = band.permutable_suffix();
        let levels = self.config.enabled_levels();
        let tiles = !levels.is_empty() && permutable > 1;
        let width = self.vector_width();
        let vector_dim = vector_dimension(band).filter(|_| self.config.vectorization && width > 1);
        if !tiles && vector_dim.is_none() {
            tracing::trace!(path = ?node.path(), "band left unchanged");
            return (node, false);
        }

        // Only the permutable suffix is transformed.
        let offset = n - permutable;
        let mut node = node;
        if offset > 0 {
            node = node.band_split(offset).child(0);
        }
        if tiles {
            for level in levels {
                let params = self.config.level(level);
                node = match level {
                    TilingLevel::First => {
                        let sizes = self
                            .cost
                            .and_then(|cost| cost.tile_size_hints())
                            .unwrap_or(params.sizes.as_slice());
                        tile(node, &level.to_string(), sizes, params.default_size)
                    }
                    TilingLevel::Second => {
                        tile(node, &level.to_string(), &params.sizes, params.default_size)
                    }
                    TilingLevel::Register => {
                        apply_register_tiling(node, &params.sizes, params.default_size)
                    }
                };
            }
            self.stats.bands_tiled += 1;
        }
        if let Some(dim) = vector_dim {
            node = prevectorize(node, dim - offset, width);
            self.stats.bands_prevectorized += 1;
        }
        (ascend_to(node, depth), true)
    }
}
