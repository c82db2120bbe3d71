//! Polytile: a schedule-tree optimizer for polyhedral loop nests.
//!
//! The optimizer itself lives in [`polytile_passes`] and the schedule trees it
//! rewrites in [`schedule_tree`]. This crate loads SCoP descriptions and runs
//! the pipeline over them.

pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod scop;

pub use errors::{PipelineError, PipelineErrorKind, PipelineResult};
pub use pipeline::{PipelineOptions, load_scop, optimize, optimize_file, parse_scop};
pub use polytile_passes::{OptimizeResult, OptimizeStats, OptimizerConfig, TargetCostModel};
pub use schedule_tree::Schedule;
