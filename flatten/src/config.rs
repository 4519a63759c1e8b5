use std::path::{Path, PathBuf};

/// Where a flattening run reads from, writes to and resolves includes
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Directory include references are resolved against.
    pub base_dir: PathBuf,
    /// Expand includes inside included fragments.
    pub recursive: bool,
}

impl FlattenConfig {
    /// Config with the base directory set to the current working directory.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        FlattenConfig {
            input_path: input_path.into(),
            output_path: output_path.into(),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            recursive: false,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Default destination for a flattened document: `dist/<stem>_flat.yaml`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    PathBuf::from("dist").join(format!("{}_flat.yaml", stem))
}

/// Default destination for a normalized document: `<stem>_norm.yaml` next
/// to the input.
pub fn default_normalized_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    input.with_file_name(format!("{}_norm.yaml", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        assert_eq!(
            default_output_path(Path::new("routes/fetch_br.yaml")),
            PathBuf::from("dist/fetch_br_flat.yaml")
        );
        assert_eq!(
            default_normalized_path(Path::new("routes/fetch_br.yaml")),
            PathBuf::from("routes/fetch_br_norm.yaml")
        );
    }

    #[test]
    fn builder_overrides() {
        let config = FlattenConfig::new("in.yaml", "out.yaml")
            .with_base_dir("/srv/flows")
            .with_recursive(true);
        assert_eq!(config.base_dir, PathBuf::from("/srv/flows"));
        assert!(config.recursive);
    }
}
