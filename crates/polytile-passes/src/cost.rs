//! Target cost model.

use crate::config::ConfigError;

/// Target properties the optimizer reads. Implementations are read-only.
pub trait CostModel {
    /// Elements per vector operation.
    fn vector_width(&self) -> i64;

    /// Width of one vector register; 0 when the target has none.
    fn vector_register_bits(&self) -> u32;

    /// Latency of a vector fused multiply-add, in cycles.
    fn fma_latency(&self) -> i64 {
        8
    }

    /// Vector fused multiply-adds issued per cycle.
    fn fma_throughput(&self) -> i64 {
        1
    }

    /// First-level tile sizes preferred by the target.
    fn tile_size_hints(&self) -> Option<&[i64]> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCostModel {
    pub vector_width: i64,
    pub vector_register_bits: u32,
    pub fma_latency: i64,
    pub fma_throughput: i64,
    pub tile_size_hints: Vec<i64>,
}

impl Default for TargetCostModel {
    fn default() -> Self {
        Self {
            vector_width: 4,
            vector_register_bits: 128,
            fma_latency: 8,
            fma_throughput: 1,
            tile_size_hints: Vec::new(),
        }
    }
}

impl TargetCostModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vector_width <= 0 {
            return Err(ConfigError::NonPositiveVectorWidth {
                width: self.vector_width,
            });
        }
        if self.vector_register_bits % 64 != 0 {
            return Err(ConfigError::VectorRegisterBits {
                bits: self.vector_register_bits,
            });
        }
        if let Some(&size) = self.tile_size_hints.iter().find(|&&size| size <= 0) {
            return Err(ConfigError::NonPositiveTileSizeHint { size });
        }
        Ok(())
    }
}

impl CostModel for TargetCostModel {
    fn vector_width(&self) -> i64 {
        self.vector_width
    }

    fn vector_register_bits(&self) -> u32 {
        self.vector_register_bits
    }

    fn fma_latency(&self) -> i64 {
        self.fma_latency
    }

    fn fma_throughput(&self) -> i64 {
        self.fma_throughput
    }

    fn tile_size_hints(&self) -> Option<&[i64]> {
        (!self.tile_size_hints.is_empty()).then_some(self.tile_size_hints.as_slice())
    }
}
