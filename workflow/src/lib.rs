pub mod error;
pub mod runner;
pub mod schema;
pub mod steps;

pub use error::WorkflowError;
pub use runner::{RunSummary, StepOutcome, StepReport, WorkflowRunner};
pub use schema::{ResponseSpec, WorkflowConfig, read_schema};
pub use steps::{StepKind, StepRef, StepSpec, discover_steps, render_inline};
