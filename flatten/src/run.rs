use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::config::FlattenConfig;
use crate::flattener::{FlattenError, Flattened, Flattener};
use crate::normalize::normalize_document;

/// Flatten the configured root document and write the result.
///
/// The output is written to a temporary file next to the destination and
/// moved into place only after the whole run succeeded.
pub fn flatten_file(config: &FlattenConfig) -> Result<Flattened, FlattenError> {
    let source = read_root(&config.input_path)?;
    let flattened = Flattener::new(&source, 0)
        .with_base_dir(&config.base_dir)
        .with_origin(&config.input_path)
        .recursive(config.recursive)
        .flatten()?;

    write_atomic(&config.output_path, &flattened.output)?;
    info!(
        output = %config.output_path.display(),
        inlined = flattened.inlined_count(),
        unresolved = flattened.unresolved().count(),
        "flattened document written"
    );
    Ok(flattened)
}

/// Normalize whitespace and line endings of a document, stripping trailing
/// whitespace from every line.
pub fn normalize_file(input: &Path, output: &Path) -> Result<(), FlattenError> {
    let source = read_root(input)?;
    write_atomic(output, &normalize_document(&source))?;
    info!(output = %output.display(), "normalized document written");
    Ok(())
}

/// Read the root document, reporting a missing file before anything else.
pub fn read_root(path: &Path) -> Result<String, FlattenError> {
    if !path.exists() {
        return Err(FlattenError::MissingRootDocument {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| FlattenError::ReadRoot {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, creating parent directories. Nothing is left
/// at `path` when writing fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), FlattenError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|source| FlattenError::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let write_err = |source: std::io::Error| FlattenError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let out = dir.path().join("dist/nested/out.yaml");
        write_atomic(&out, "a: 1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a: 1\n");
    }

    #[test]
    fn write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let out = dir.path().join("out.yaml");
        std::fs::write(&out, "old").unwrap();
        write_atomic(&out, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "new");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temporary file left behind");
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let err = read_root(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, FlattenError::MissingRootDocument { .. }));
    }
}
