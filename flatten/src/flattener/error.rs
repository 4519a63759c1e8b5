use std::io;
use std::ops::Range;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Fatal flattening failures. Everything that only degrades the output is
/// a [`FlattenDiagnostic`] instead.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("root document not found: {}", path.display())]
    MissingRootDocument { path: PathBuf },

    #[error("cannot read root document '{}': {source}", path.display())]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read fragment '{reference}' at '{}': {source}", path.display())]
    FragmentRead {
        reference: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("include cycle: {}", format_chain(chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    #[error("cannot create output directory '{}': {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write output '{}': {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A non-fatal finding with a location in the normalized root document.
#[derive(Debug, Clone)]
pub struct FlattenDiagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl FlattenDiagnostic {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        FlattenDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
