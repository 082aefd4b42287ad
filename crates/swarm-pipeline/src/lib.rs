//! Contract generation pipeline.
//!
//! `ContractPipeline` drives the agents of a `StagePlan` in order, records
//! each output in a `StageResult`, then prepares the Anchor project, writes
//! the generated program, and runs the build. Progress is published as
//! `PipelineEvent`s.

pub mod engine;
pub mod events;
pub mod plan;

pub use engine::{standard_agents, ContractPipeline, PipelineConfig, PipelineRun};
pub use events::{EventEmitter, PipelineEvent};
pub use plan::{StagePlan, StageSpec};
