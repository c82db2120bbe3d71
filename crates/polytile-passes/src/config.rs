//! Optimizer configuration.

use derive_more::{Display, Error};

/// Tiling levels, outermost first. The display form is the identifier the
/// level's marks carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum TilingLevel {
    #[display("Tiling")]
    First,
    #[display("Second level tiling")]
    Second,
    #[display("Register tiling")]
    Register,
}

/// Tile sizes of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilingParams {
    pub enabled: bool,
    /// Explicit sizes for the outermost band members.
    pub sizes: Vec<i64>,
    /// Size of every member past `sizes`.
    pub default_size: i64,
}

impl TilingParams {
    pub fn new(enabled: bool, sizes: Vec<i64>, default_size: i64) -> Self {
        Self {
            enabled,
            sizes,
            default_size,
        }
    }

    /// Sizes for a band of `n_member` members.
    pub fn sizes_for(&self, n_member: usize) -> Vec<i64> {
        tile_sizes(n_member, &self.sizes, self.default_size)
    }
}

/// Sizes for `n_member` members: `sizes` first, then `default_size`.
pub fn tile_sizes(n_member: usize, sizes: &[i64], default_size: i64) -> Vec<i64> {
    (0..n_member)
        .map(|pos| sizes.get(pos).copied().unwrap_or(default_size))
        .collect()
}

/// Configuration for the schedule optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Master switch for every tiling level. Default: true.
    pub tiling: bool,
    /// Prevectorize the innermost coincident dimension. Default: true.
    pub vectorization: bool,
    /// Detect matrix multiplication and build micro-kernels. Default: true.
    pub pattern_matching: bool,
    /// Cache tiling. Default: enabled, 32.
    pub first_level: TilingParams,
    /// Default: disabled, 16.
    pub second_level: TilingParams,
    /// Register tiling of the innermost point band. Default: disabled, 2.
    pub register: TilingParams,
    /// Vector width used when no cost model is supplied. Default: 4.
    pub prevector_width: i64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tiling: true,
            vectorization: true,
            pattern_matching: true,
            first_level: TilingParams::new(true, Vec::new(), 32),
            second_level: TilingParams::new(false, Vec::new(), 16),
            register: TilingParams::new(false, Vec::new(), 2),
            prevector_width: 4,
        }
    }
}

impl OptimizerConfig {
    pub fn with_tiling(mut self, enabled: bool) -> Self {
        self.tiling = enabled;
        self
    }

    pub fn with_vectorization(mut self, enabled: bool) -> Self {
        self.vectorization = enabled;
        self
    }

    pub fn with_pattern_matching(mut self, enabled: bool) -> Self {
        self.pattern_matching = enabled;
        self
    }

    pub fn with_first_level_tile_sizes(mut self, sizes: Vec<i64>, default_size: i64) -> Self {
        self.first_level = TilingParams::new(true, sizes, default_size);
        self
    }

    pub fn with_second_level_tiling(mut self, sizes: Vec<i64>, default_size: i64) -> Self {
        self.second_level = TilingParams::new(true, sizes, default_size);
        self
    }

    pub fn with_register_tiling(mut self, sizes: Vec<i64>, default_size: i64) -> Self {
        self.register = TilingParams::new(true, sizes, default_size);
        self
    }

    pub fn with_prevector_width(mut self, width: i64) -> Self {
        self.prevector_width = width;
        self
    }

    pub fn level(&self, level: TilingLevel) -> &TilingParams {
        match level {
            TilingLevel::First => &self.first_level,
            TilingLevel::Second => &self.second_level,
            TilingLevel::Register => &self.register,
        }
    }

    /// Levels that will run, outermost first.
    pub fn enabled_levels(&self) -> Vec<TilingLevel> {
        if !self.tiling {
            return Vec::new();
        }
        [TilingLevel::First, TilingLevel::Second, TilingLevel::Register]
            .into_iter()
            .filter(|&level| self.level(level).enabled)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for level in [TilingLevel::First, TilingLevel::Second, TilingLevel::Register] {
            let params = self.level(level);
            if let Some(&size) = params
                .sizes
                .iter()
                .chain([&params.default_size])
                .find(|&&size| size <= 0)
            {
                return Err(ConfigError::NonPositiveTileSize { level, size });
            }
        }
        if self.prevector_width <= 0 {
            return Err(ConfigError::NonPositiveVectorWidth {
                width: self.prevector_width,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConfigError {
    #[display("{level}: tile sizes must be positive, got {size}")]
    NonPositiveTileSize {
        #[error(not(source))]
        level: TilingLevel,
        size: i64,
    },
    #[display("target tile size hints must be positive, got {size}")]
    NonPositiveTileSizeHint { size: i64 },
    #[display("vector width must be positive, got {width}")]
    NonPositiveVectorWidth { width: i64 },
    #[display("vector register width must be a multiple of 64 bits, got {bits}")]
    VectorRegisterBits { bits: u32 },
}
