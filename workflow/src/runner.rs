use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use flatten::reference::resolve::Resolver;

use crate::error::WorkflowError;
use crate::schema::{WorkflowConfig, read_schema};
use crate::steps::{StepKind, StepRef, StepSpec, discover_steps, render_inline};

const UNKNOWN: &str = "Unknown";

/// What happened when a step was simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed(StepKind),
    Missing,
    Empty,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub number: usize,
    pub path: PathBuf,
    pub outcome: StepOutcome,
}

/// Final response of a simulated workflow run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub message: String,
    pub status_code: u16,
    pub execution_time: String,
    pub steps_executed: usize,
    pub workflow_path: String,
    pub method: String,
    #[serde(skip)]
    pub reports: Vec<StepReport>,
}

/// Simulates a workflow by walking its included steps in order.
pub struct WorkflowRunner {
    config: WorkflowConfig,
    steps: Vec<StepRef>,
    resolver: Resolver,
    /// Multiplier on simulated step durations; 0 disables sleeping.
    pace: f64,
}

impl WorkflowRunner {
    pub fn from_source(source: &str, base_dir: impl Into<PathBuf>) -> Result<Self, WorkflowError> {
        Ok(WorkflowRunner {
            config: read_schema(source)?,
            steps: discover_steps(source),
            resolver: Resolver::new(base_dir),
            pace: 1.0,
        })
    }

    pub fn from_file(path: &Path, base_dir: impl Into<PathBuf>) -> Result<Self, WorkflowError> {
        if !path.exists() {
            return Err(WorkflowError::MissingWorkflow {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path).map_err(|source| WorkflowError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(&source, base_dir)
    }

    pub fn with_pace(mut self, pace: f64) -> Self {
        self.pace = pace.max(0.0);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn steps(&self) -> &[StepRef] {
        &self.steps
    }

    /// Simulate every step, writing progress to `out`.
    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary, WorkflowError> {
        writeln!(
            out,
            "Starting workflow: {}",
            self.config.path.as_deref().unwrap_or(UNKNOWN)
        )?;
        writeln!(out, "Method: {}", self.config.method.as_deref().unwrap_or(UNKNOWN))?;
        writeln!(out, "Total steps found: {}", self.steps.len())?;
        writeln!(out, "{}", "=".repeat(60))?;

        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            reports.push(self.execute_step(step, out)?);
        }

        Ok(RunSummary {
            message: self
                .config
                .response
                .message
                .clone()
                .unwrap_or_else(|| "Workflow completed".to_string()),
            status_code: self.config.response.status_code.unwrap_or(200),
            execution_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            steps_executed: self.steps.len(),
            workflow_path: self.config.path.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            method: self.config.method.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            reports,
        })
    }

    fn execute_step(&self, step: &StepRef, out: &mut dyn Write) -> Result<StepReport, WorkflowError> {
        writeln!(out)?;
        writeln!(out, "Step {}: processing", step.number)?;
        writeln!(out, "  file: {}", step.include_path)?;

        let path = self.resolver.resolve(&step.include_path);
        let outcome = if !self.resolver.exists(&step.include_path, &path) {
            warn!(step = step.number, path = %path.display(), "step file not found");
            writeln!(out, "  file not found: {}", step.include_path)?;
            StepOutcome::Missing
        } else {
            match load_step(&path) {
                Ok(Some(spec)) => {
                    let kind = self.simulate(&spec, out)?;
                    StepOutcome::Completed(kind)
                }
                Ok(None) => {
                    writeln!(out, "  empty step file")?;
                    StepOutcome::Empty
                }
                Err(message) => {
                    warn!(step = step.number, path = %path.display(), "cannot load step: {}", message);
                    writeln!(out, "  error loading step: {}", message)?;
                    StepOutcome::Invalid(message)
                }
            }
        };

        Ok(StepReport {
            number: step.number,
            path,
            outcome,
        })
    }

    fn simulate(&self, spec: &StepSpec, out: &mut dyn Write) -> Result<StepKind, WorkflowError> {
        let kind = spec.step_kind();
        writeln!(out, "  id: {}", spec.id.as_deref().unwrap_or("unknown"))?;
        writeln!(out, "  name: {}", spec.name.as_deref().unwrap_or("unnamed"))?;
        writeln!(out, "  type: {}", spec.kind.as_deref().unwrap_or("generic"))?;
        writeln!(out, "  description: {}", spec.desc.as_deref().unwrap_or("No description"))?;

        writeln!(out, "  executing {}...", kind.activity())?;
        let millis = kind.base_millis() as f64 * self.pace;
        if millis > 0.0 {
            debug!(kind = %kind, millis, "simulating step");
            std::thread::sleep(Duration::from_secs_f64(millis / 1000.0));
        }
        writeln!(out, "  {} completed", kind.activity())?;

        if let Some(branches) = &spec.branches {
            writeln!(out, "  branches configured: {}", render_inline(branches))?;
        }
        Ok(kind)
    }
}

/// `Ok(None)` for an empty document, `Err` with a message when the file
/// cannot be read or is not a step mapping.
fn load_step(path: &Path) -> Result<Option<StepSpec>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| e.to_string())?;
    if value.is_null() {
        return Ok(None);
    }
    serde_yaml::from_value(value)
        .map(Some)
        .map_err(|e| e.to_string())
}
