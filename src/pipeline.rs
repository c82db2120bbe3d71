//! Optimization pipeline.
//!
//! ```text
//! SCoP file (JSON)
//!     │
//!     ▼
//! parse_scop ─► Schedule (validated)
//!     │
//!     ▼
//! optimize ─► OptimizeResult (schedule kept only if profitable)
//! ```

use std::path::Path;

use polytile_passes::{
    OptimizeResult, OptimizerConfig, TargetCostModel, is_profitable, optimize_schedule_with_config,
};
use schedule_tree::Schedule;

use crate::errors::{PipelineError, PipelineResult};
use crate::scop::ScopDef;

/// Everything the optimizer needs besides the schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub config: OptimizerConfig,
    /// Target description; without one the configured prevector width and
    /// default micro-kernel parameters are used.
    pub target: Option<TargetCostModel>,
}

impl PipelineOptions {
    pub fn validate(&self) -> PipelineResult<()> {
        self.config.validate()?;
        if let Some(target) = &self.target {
            target.validate()?;
        }
        Ok(())
    }
}

/// Parse and validate a SCoP description.
pub fn parse_scop(source: &str) -> PipelineResult<Schedule> {
    let def: ScopDef = serde_json::from_str(source)?;
    let schedule = def.into_schedule()?;
    schedule.validate()?;
    tracing::debug!(
        statements = schedule.statements().len(),
        instances = %schedule.domain().card(),
        "loaded SCoP"
    );
    Ok(schedule)
}

pub fn load_scop(path: &Path) -> PipelineResult<Schedule> {
    let source = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    parse_scop(&source)
}

/// Optimize a schedule with the given options.
pub fn optimize(schedule: Schedule, options: &PipelineOptions) -> PipelineResult<OptimizeResult> {
    options.validate()?;
    let cost = options
        .target
        .as_ref()
        .map(|target| target as &dyn polytile_passes::CostModel);
    Ok(optimize_schedule_with_config(schedule, cost, &options.config))
}

pub fn optimize_file(path: &Path, options: &PipelineOptions) -> PipelineResult<OptimizeResult> {
    let schedule = load_scop(path)?;
    optimize(schedule, options)
}

/// Whether the schedule in `candidate` is a profitable replacement for the
/// one in `original`.
pub fn compare_files(original: &Path, candidate: &Path) -> PipelineResult<bool> {
    let original = load_scop(original)?;
    let candidate = load_scop(candidate)?;
    Ok(is_profitable(&original, &candidate))
}
