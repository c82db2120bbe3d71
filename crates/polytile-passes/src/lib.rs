//! Schedule optimizer passes.
//!
//! - [`classify`]: which bands may be tiled and which member to vectorize
//! - [`access_pattern`]: matrix-multiply recognition
//! - [`tiling`]: multi-level tiling with tile/point marks
//! - [`vectorize`]: prevectorization and full/partial tile isolation
//! - [`matmul_kernel`]: register-blocked micro-kernels
//! - [`profitability`]: whole-schedule accept/reject check
//! - [`driver`]: the top-down walk tying them together

use schedule_tree::ScheduleNode;

pub mod access_pattern;
pub mod classify;
pub mod config;
pub mod cost;
pub mod driver;
pub mod matmul_kernel;
pub mod profitability;
pub mod tiling;
pub mod vectorize;

#[cfg(test)]
mod fixtures;

pub use access_pattern::{MatMulCandidate, match_matmul};
pub use config::{ConfigError, OptimizerConfig, TilingLevel, TilingParams};
pub use cost::{CostModel, TargetCostModel};
pub use driver::{
    OptimizeResult, OptimizeStats, optimize_schedule, optimize_schedule_node,
    optimize_schedule_node_with_config, optimize_schedule_with_config,
};
pub use profitability::{LocalityProfile, is_profitable};
pub use vectorize::{isolate_full_partial_tiles, prevectorize};

/// Move the cursor up until it is `depth` nodes below the root.
pub(crate) fn ascend_to(mut node: ScheduleNode, depth: usize) -> ScheduleNode {
    while node.path().len() > depth {
        node = node.parent();
    }
    node
}
