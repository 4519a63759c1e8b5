use std::path::{Component, Path, PathBuf};

use crate::reference::SanitizedReference;

/// Joins sanitized references onto a fixed base directory.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
}

impl Resolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Resolver {
            base_dir: base_dir.into(),
        }
    }

    /// Join and lexically normalize. Does not touch the file system.
    pub fn resolve(&self, reference: &SanitizedReference) -> PathBuf {
        let unified = reference.as_str().replace('\\', "/");
        normalize_path(&self.base_dir.join(unified))
    }

    /// Whether `resolved` names a regular file. An empty reference never
    /// exists, even though it resolves to the base directory itself.
    pub fn exists(&self, reference: &SanitizedReference, resolved: &Path) -> bool {
        !reference.is_empty() && resolved.is_file()
    }
}

/// Collapse `.` and `..` segments without consulting the file system.
/// A `..` that has no normal segment to pop is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last().copied() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.into_iter().collect()
}
