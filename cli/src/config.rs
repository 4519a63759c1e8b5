use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "yamlflat.toml";

/// Defaults for `yamlflat flatten`, read from TOML. Flags win over these.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub recursive: Option<bool>,
}

/// Load an explicit config file, or `yamlflat.toml` when present.
/// An explicit path that does not exist is an error.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    parse(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse(text: &str) -> Result<FileConfig, String> {
    toml::from_str(text).map_err(|e| format!("TOML parse error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config = parse(
            "input = \"routes/fetch_br.yaml\"\noutput = \"dist/out.yaml\"\nbase_dir = \".\"\nrecursive = true\n",
        )
        .unwrap();
        assert_eq!(config.input, Some(PathBuf::from("routes/fetch_br.yaml")));
        assert_eq!(config.output, Some(PathBuf::from("dist/out.yaml")));
        assert_eq!(config.base_dir, Some(PathBuf::from(".")));
        assert_eq!(config.recursive, Some(true));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = parse("inptu = \"x.yaml\"\n").unwrap_err();
        assert!(err.contains("TOML parse error"), "{}", err);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("cannot read config"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("flat.toml");
        std::fs::write(&path, "recursive = false\n").unwrap();
        assert_eq!(load(Some(&path)).unwrap().recursive, Some(false));
    }
}
