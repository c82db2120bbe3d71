//! Register-blocked micro-kernel for matrix multiplication.
//!
//! The `(i, j)` plane is tiled into `Mr x Nr` register blocks and the point
//! loops are fully unrolled, so one iteration of the reduction loop performs
//! a rank-1 update of the block with no inner loop control. Blocking the
//! operands for caches (the macro-kernel) and packing them is left to the
//! surrounding loops.

use schedule_tree::ScheduleNode;

use crate::access_pattern::MatMulCandidate;
use crate::cost::CostModel;
use crate::tiling::apply_register_tiling;

/// Register block shape of the micro-kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroKernelParams {
    pub mr: i64,
    pub nr: i64,
}

impl MicroKernelParams {
    /// Derive the block from the vector registers and FMA pipeline.
    ///
    /// With `Nvec` doubles per register, `Nvec * latency * throughput`
    /// independent accumulators keep the FMA units busy. `Nr` is a multiple
    /// of `Nvec` close to the square root of that count, `Mr` covers the
    /// rest.
    pub fn for_target(cost: &dyn CostModel) -> Self {
        let nvec = match i64::from(cost.vector_register_bits() / 64) {
            0 => 2,
            n => n,
        };
        let accumulators = nvec * cost.fma_latency() * cost.fma_throughput();
        let nr = ((accumulators as f64).sqrt() / nvec as f64).ceil() as i64 * nvec;
        let mr = (accumulators + nr - 1) / nr;
        Self { mr, nr }
    }
}

/// Turn a matched band into a micro-kernel. Returns the cursor at the
/// unrolled point band.
pub fn build_kernel(
    node: ScheduleNode,
    candidate: &MatMulCandidate,
    cost: &dyn CostModel,
) -> ScheduleNode {
    let Some(band) = node.band() else {
        panic!("build_kernel applied to a {} node", node.kind())
    };
    assert!(
        band.n_member() == 3 && band.member(0).expr(candidate.stmt()).is_some(),
        "build_kernel applied to a band that was not matched"
    );
    let params = MicroKernelParams::for_target(cost);
    tracing::debug!(mr = params.mr, nr = params.nr, "building matmul micro-kernel");
    apply_register_tiling(node, &[params.mr, params.nr], 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_pattern::match_matmul;
    use crate::cost::TargetCostModel;
    use crate::fixtures::gemm;
    use schedule_tree::{AstOption, StmtId};

    fn target(bits: u32) -> TargetCostModel {
        TargetCostModel {
            vector_register_bits: bits,
            ..TargetCostModel::default()
        }
    }

    #[test]
    fn params_follow_register_width() {
        assert_eq!(
            MicroKernelParams::for_target(&target(128)),
            MicroKernelParams { mr: 4, nr: 4 }
        );
        assert_eq!(
            MicroKernelParams::for_target(&target(256)),
            MicroKernelParams { mr: 4, nr: 8 }
        );
        assert_eq!(
            MicroKernelParams::for_target(&target(512)),
            MicroKernelParams { mr: 8, nr: 8 }
        );
        // no vector registers: assume two doubles
        assert_eq!(
            MicroKernelParams::for_target(&target(0)),
            MicroKernelParams::for_target(&target(128))
        );
    }

    #[test]
    fn kernel_unrolls_register_block() {
        let node = gemm(16).into_root();
        let candidate = match_matmul(&node).unwrap();
        let node = build_kernel(node, &candidate, &target(256));

        let point = node.band().unwrap();
        assert_eq!(point.ast_option, AstOption::Unroll);
        let s = StmtId::new(0);
        // (i mod 4, j mod 8, k mod 1)
        assert_eq!(point.member(0).eval(s, &[7, 13, 5]), 3);
        assert_eq!(point.member(1).eval(s, &[7, 13, 5]), 5);
        assert!(point.member(2).expr(s).unwrap().is_degenerate());

        let tiles = node.parent().parent();
        let tile = tiles.band().unwrap();
        assert_eq!(tile.member(2).eval(s, &[7, 13, 5]), 5);
        assert_eq!(tiles.parent().node().as_mark(), Some("Register tiling - Tiles"));
    }
}
