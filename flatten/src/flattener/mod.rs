pub mod error;

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use error::{FlattenDiagnostic, FlattenError};

use crate::directive::IncludeDirective;
use crate::directive::args::{ArgsBlock, collect_args};
use crate::inline::{FragmentShape, inline_fragment};
use crate::normalize::normalize;
use crate::reference::resolve::Resolver;
use crate::reference::{SanitizedReference, sanitize};

/// Header written above the trace comments of a preserved args block.
pub const ARGS_HEADER: &str = "# ---- args (preserved for reference) ----";

/// Outcome of a single include directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStatus {
    Inlined(FragmentShape),
    /// Reference did not name an existing file; directive kept verbatim.
    Unresolved,
}

/// What happened to one include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRecord {
    /// 1-based line of the directive within its document.
    pub line: usize,
    /// Fragment that contained the directive; `None` for the root document.
    pub origin: Option<PathBuf>,
    pub raw_target: String,
    pub reference: SanitizedReference,
    pub path: PathBuf,
    /// Number of args lines attached to the directive.
    pub args: usize,
    pub status: IncludeStatus,
}

/// Result of a flattening run.
#[derive(Debug, Clone)]
pub struct Flattened {
    /// Normalized root document; diagnostic spans point into it.
    pub source: String,
    pub output: String,
    pub includes: Vec<IncludeRecord>,
    pub diagnostics: Vec<FlattenDiagnostic>,
}

impl Flattened {
    pub fn unresolved(&self) -> impl Iterator<Item = &IncludeRecord> {
        self.includes
            .iter()
            .filter(|r| r.status == IncludeStatus::Unresolved)
    }

    pub fn inlined_count(&self) -> usize {
        self.includes
            .iter()
            .filter(|r| matches!(r.status, IncludeStatus::Inlined(_)))
            .count()
    }
}

/// Flattening entry point over an in-memory root document.
pub struct Flattener {
    source: String,
    file_id: usize,
    resolver: Resolver,
    origin: Option<PathBuf>,
    recursive: bool,
}

impl Flattener {
    /// The source is whitespace-normalized on construction; diagnostic spans
    /// refer to [`Flattener::source`].
    pub fn new(source: &str, file_id: usize) -> Self {
        Flattener {
            source: normalize(source),
            file_id,
            resolver: Resolver::new("."),
            origin: None,
            recursive: false,
        }
    }

    /// Directory include references are resolved against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.resolver = Resolver::new(base_dir);
        self
    }

    /// Path of the root document, used to catch fragments that include it.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    /// Expand includes found inside included fragments as well.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flatten(&self) -> Result<Flattened, FlattenError> {
        let mut pass = Pass {
            flattener: self,
            active: self.origin.iter().map(|p| cycle_key(p)).collect(),
            includes: Vec::new(),
            diagnostics: Vec::new(),
        };
        let lines = pass.flatten_text(&self.source, None)?;
        Ok(Flattened {
            source: self.source.clone(),
            output: lines.join("\n"),
            includes: pass.includes,
            diagnostics: pass.diagnostics,
        })
    }
}

struct Pass<'f> {
    flattener: &'f Flattener,
    /// Canonical paths of the documents currently being expanded.
    active: Vec<PathBuf>,
    includes: Vec<IncludeRecord>,
    diagnostics: Vec<FlattenDiagnostic>,
}

impl Pass<'_> {
    fn flatten_text(&mut self, text: &str, origin: Option<&Path>) -> Result<Vec<String>, FlattenError> {
        let flattener = self.flattener;
        let lines: Vec<&str> = text.split('\n').collect();
        let offsets = line_offsets(&lines);
        let mut out = Vec::with_capacity(lines.len());

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let Some(directive) = IncludeDirective::parse(line) else {
                out.push(line.to_string());
                i += 1;
                continue;
            };

            let reference = sanitize(directive.raw_target);
            let (next, args) = collect_args(&lines, i + 1, directive.indent);
            if args.unterminated {
                self.flag_unterminated(&args, &lines, &offsets, origin);
            }

            let resolver = &flattener.resolver;
            let path = resolver.resolve(&reference);
            let mut record = IncludeRecord {
                line: i + 1,
                origin: origin.map(Path::to_path_buf),
                raw_target: directive.raw_target.to_string(),
                reference,
                path,
                args: args.len(),
                status: IncludeStatus::Unresolved,
            };

            if !resolver.exists(&record.reference, &record.path) {
                warn!(
                    line = record.line,
                    reference = %record.reference,
                    path = %record.path.display(),
                    "include not found, keeping directive"
                );
                if origin.is_none() {
                    let span = offsets[i]..offsets[i] + line.len();
                    self.diagnostics.push(
                        FlattenDiagnostic::warning(
                            format!("unresolved include '{}'", record.reference),
                            span,
                            flattener.file_id,
                        )
                        .with_note(format!("looked for {}", record.path.display())),
                    );
                }
                out.push(line.to_string());
                out.extend(args.lines.iter().map(|a| a.to_string()));
                self.includes.push(record);
                i = next;
                continue;
            }

            debug!(
                line = record.line,
                reference = %record.reference,
                path = %record.path.display(),
                "inlining fragment"
            );
            let fragment = read_fragment(&record.reference, &record.path)?;
            let fragment = if flattener.recursive {
                let first_nested = self.includes.len();
                let expanded = self.expand(&fragment, &record.path)?;
                if origin.is_none() {
                    let span = offsets[i]..offsets[i] + line.len();
                    self.flag_nested_unresolved(first_nested, &record, span);
                }
                expanded
            } else {
                fragment
            };

            let inlined = inline_fragment(&fragment, directive.indent);
            out.extend(inlined.lines);
            if !args.is_empty() {
                out.push(format!("{}  {}", directive.indent, ARGS_HEADER));
                for a in &args.lines {
                    out.push(format!("{}  # {}", directive.indent, a.trim()));
                }
            }

            record.status = IncludeStatus::Inlined(inlined.shape);
            self.includes.push(record);
            i = next;
        }

        Ok(out)
    }

    /// Flatten a fragment before it is inlined, failing on include cycles.
    fn expand(&mut self, fragment: &str, path: &Path) -> Result<String, FlattenError> {
        let key = cycle_key(path);
        if self.active.contains(&key) {
            let mut chain = self.active.clone();
            chain.push(key);
            return Err(FlattenError::IncludeCycle { chain });
        }
        self.active.push(key);
        let lines = self.flatten_text(fragment, Some(path));
        self.active.pop();
        Ok(lines?.join("\n"))
    }

    /// Point at the root directive whose fragment left includes unresolved,
    /// since nested documents have no span of their own.
    fn flag_nested_unresolved(&mut self, first_nested: usize, record: &IncludeRecord, span: Range<usize>) {
        let notes: Vec<String> = self.includes[first_nested..]
            .iter()
            .filter(|r| r.status == IncludeStatus::Unresolved)
            .map(|r| match &r.origin {
                Some(origin) => format!("{}:{}: '{}' not found", origin.display(), r.line, r.reference),
                None => format!("line {}: '{}' not found", r.line, r.reference),
            })
            .collect();
        if notes.is_empty() {
            return;
        }
        let diagnostic = FlattenDiagnostic::warning(
            format!(
                "fragment '{}' leaves {} include(s) unresolved",
                record.reference,
                notes.len()
            ),
            span,
            self.flattener.file_id,
        );
        self.diagnostics
            .push(notes.into_iter().fold(diagnostic, FlattenDiagnostic::with_note));
    }

    fn flag_unterminated(
        &mut self,
        args: &ArgsBlock<'_>,
        lines: &[&str],
        offsets: &[usize],
        origin: Option<&Path>,
    ) {
        warn!(line = args.start + 1, "args block runs to end of document");
        if origin.is_some() {
            return;
        }
        let last = lines.len() - 1;
        let span = offsets[args.start]..offsets[last] + lines[last].len();
        self.diagnostics.push(
            FlattenDiagnostic::warning("args block is never closed", span, self.flattener.file_id)
                .with_note("collected through end of document"),
        );
    }
}

fn read_fragment(reference: &SanitizedReference, path: &Path) -> Result<String, FlattenError> {
    std::fs::read_to_string(path)
        .map(|text| normalize(&text))
        .map_err(|source| FlattenError::FragmentRead {
            reference: reference.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

fn cycle_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Byte offset at which each line starts, assuming `\n` separators.
fn line_offsets(lines: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lines.len());
    let mut offset = 0;
    for line in lines {
        offsets.push(offset);
        offset += line.len() + 1;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten_in(dir: &Path, source: &str) -> Flattened {
        Flattener::new(source, 0)
            .with_base_dir(dir)
            .flatten()
            .expect("flatten failed")
    }

    #[test]
    fn no_directives_is_identity() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let source = "path: /fetch\nmethod: GET\nsteps:\n  - name: a\n";
        let flat = flatten_in(dir.path(), source);
        assert_eq!(flat.output, source);
        assert!(flat.includes.is_empty());
        assert!(flat.diagnostics.is_empty());
    }

    #[test]
    fn diagnostic_span_covers_directive_line() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let source = "steps:\n  - !include missing.yaml\n";
        let flat = flatten_in(dir.path(), source);
        assert_eq!(flat.diagnostics.len(), 1);
        let span = flat.diagnostics[0].span.clone();
        assert_eq!(&source[span], "  - !include missing.yaml");
    }

    #[test]
    fn unterminated_args_is_flagged_not_fatal() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::write(dir.path().join("a.yaml"), "name: a\n").unwrap();
        let source = "- !include a.yaml\n  args:\n    x: 1";
        let flat = flatten_in(dir.path(), source);
        assert_eq!(flat.diagnostics.len(), 1);
        assert_eq!(&source[flat.diagnostics[0].span.clone()], "  args:\n    x: 1");
        assert_eq!(
            flat.output,
            "- name: a\n  # ---- args (preserved for reference) ----\n  # args:\n  # x: 1"
        );
    }

    #[test]
    fn line_offsets_track_separators() {
        assert_eq!(line_offsets(&["ab", "", "c"]), vec![0, 3, 4]);
    }
}
