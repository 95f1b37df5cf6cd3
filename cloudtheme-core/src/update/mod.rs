//! Cloud theme reconciliation: the settings observer loop, its task
//! registry, the per-theme resolution pipeline and the write-back merge.

pub mod manager;
pub mod merge;
pub mod pipeline;
pub mod registry;
pub mod task;

mod observer;

pub use manager::{AccountHandle, SharedSettingsAccessor, ThemeUpdateManager};
pub use pipeline::{PipelineDeps, PipelineEmission, PipelineExit, ResolutionPipeline};
pub use registry::{ReconcileOutcome, TaskRegistry};
