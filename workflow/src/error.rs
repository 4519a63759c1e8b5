use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow file not found: {}", path.display())]
    MissingWorkflow { path: PathBuf },

    #[error("cannot read workflow '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid {field} on line {line}: '{value}'")]
    InvalidField {
        field: &'static str,
        line: usize,
        value: String,
    },

    #[error("cannot write progress: {0}")]
    Output(#[from] io::Error),
}
