//! Command-line interface for the schedule optimizer.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use polytile::{OptimizerConfig, PipelineOptions, TargetCostModel};

#[derive(Parser)]
#[command(name = "polytile")]
#[command(about = "Schedule-tree optimizer for polyhedral loop nests", long_about = None)]
pub struct Cli {
    /// Log optimizer decisions to stderr (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Optimize the schedule of a SCoP description and print it
    #[command(alias = "opt")]
    Optimize {
        file: PathBuf,
        #[command(flatten)]
        args: OptimizeArgs,
        /// Print what the optimizer changed
        #[arg(long)]
        stats: bool,
    },
    /// Print the schedule of a SCoP description
    Show { file: PathBuf },
    /// Check whether a candidate schedule is a profitable replacement
    Compare { original: PathBuf, candidate: PathBuf },
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Disable every tiling level
    #[arg(long)]
    pub no_tiling: bool,
    #[arg(long)]
    pub no_vectorization: bool,
    /// Do not look for matrix multiplications
    #[arg(long)]
    pub no_pattern_matching: bool,

    /// First-level tile sizes, outermost member first
    #[arg(long, value_delimiter = ',')]
    pub tile_sizes: Vec<i64>,
    #[arg(long, default_value_t = 32)]
    pub default_tile_size: i64,

    #[arg(long)]
    pub second_level_tiling: bool,
    #[arg(long, value_delimiter = ',')]
    pub second_level_tile_sizes: Vec<i64>,
    #[arg(long, default_value_t = 16)]
    pub second_level_default_tile_size: i64,

    #[arg(long)]
    pub register_tiling: bool,
    #[arg(long, value_delimiter = ',')]
    pub register_tile_sizes: Vec<i64>,
    #[arg(long, default_value_t = 2)]
    pub register_default_tile_size: i64,

    /// Vector width used without a target description
    #[arg(long, default_value_t = 4)]
    pub prevector_width: i64,

    /// Describe the target: elements per vector operation
    #[arg(long)]
    pub vector_width: Option<i64>,
    /// Describe the target: vector register width in bits
    #[arg(long)]
    pub vector_register_bits: Option<u32>,
    #[arg(long, default_value_t = 8)]
    pub fma_latency: i64,
    #[arg(long, default_value_t = 1)]
    pub fma_throughput: i64,
}

impl OptimizeArgs {
    pub fn to_options(&self) -> PipelineOptions {
        let mut config = OptimizerConfig::default()
            .with_tiling(!self.no_tiling)
            .with_vectorization(!self.no_vectorization)
            .with_pattern_matching(!self.no_pattern_matching)
            .with_first_level_tile_sizes(self.tile_sizes.clone(), self.default_tile_size)
            .with_prevector_width(self.prevector_width);
        if self.second_level_tiling {
            config = config.with_second_level_tiling(
                self.second_level_tile_sizes.clone(),
                self.second_level_default_tile_size,
            );
        }
        if self.register_tiling {
            config = config.with_register_tiling(
                self.register_tile_sizes.clone(),
                self.register_default_tile_size,
            );
        }

        let target = (self.vector_width.is_some() || self.vector_register_bits.is_some()).then(|| {
            let defaults = TargetCostModel::default();
            TargetCostModel {
                vector_width: self.vector_width.unwrap_or(defaults.vector_width),
                vector_register_bits: self
                    .vector_register_bits
                    .unwrap_or(defaults.vector_register_bits),
                fma_latency: self.fma_latency,
                fma_throughput: self.fma_throughput,
                tile_size_hints: Vec::new(),
            }
        });
        PipelineOptions { config, target }
    }
}
