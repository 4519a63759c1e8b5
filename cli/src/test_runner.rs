use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use flatten::{FlattenError, Flattener};

const TEST_SUFFIX: &str = ".test.yaml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expand includes inside included fragments.
    #[serde(default)]
    pub recursive: bool,

    /// Expected flattened document (trailing newlines ignored).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substring the fatal error message must contain.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected number of includes left unresolved.
    #[serde(default)]
    pub expect_unresolved: Option<usize>,
}

/// Split a `.test.yaml` file into its TOML config and the root document.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    // Fragments live next to the test case.
    let base_dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let result = Flattener::new(source, 0)
        .with_base_dir(base_dir)
        .with_origin(path)
        .recursive(config.recursive)
        .flatten();

    let reason = match (&config.expect_error, result) {
        (Some(expected), Err(err)) => check_error(expected, &err),
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but flattening succeeded",
            expected
        )),
        (None, Err(err)) => Some(format!("unexpected error: {}", err)),
        (None, Ok(flat)) => {
            let output_reason = config.expect_output.as_deref().and_then(|expected| {
                let expected = expected.trim_end_matches('\n');
                let actual = flat.output.trim_end_matches('\n');
                if expected == actual {
                    None
                } else {
                    Some(format!(
                        "output mismatch\n  expected:\n{}\n  actual:\n{}",
                        indent(expected),
                        indent(actual)
                    ))
                }
            });
            output_reason.or_else(|| {
                let expected = config.expect_unresolved?;
                let actual = flat.unresolved().count();
                if expected == actual {
                    None
                } else {
                    let refs: Vec<String> = flat
                        .unresolved()
                        .map(|r| format!("    - line {}: {}", r.line, r.reference))
                        .collect();
                    Some(format!(
                        "expected {} unresolved include(s), got {}\n{}",
                        expected,
                        actual,
                        refs.join("\n")
                    ))
                }
            })
        }
    };

    match reason {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

fn check_error(expected: &str, err: &FlattenError) -> Option<String> {
    let err_str = err.to_string();
    if err_str.contains(expected) {
        None
    } else {
        Some(format!(
            "expected error containing \"{}\", got: {}",
            expected, err_str
        ))
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    | {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Discover `.test.yaml` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(TEST_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run all `.test.yaml` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        match filter_categories(all_categories, categories) {
            Some(filtered) => filtered,
            None => {
                eprintln!("no matching categories found");
                return 1;
            }
        }
    };

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!();
        eprintln!("{}", paint(header, "1", no_color));

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Keep the requested categories (and their subcategories). `None` when
/// nothing matched.
fn filter_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> Option<BTreeMap<String, Vec<PathBuf>>> {
    if requested.is_empty() {
        return Some(all);
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let matches: Vec<&String> = all
            .keys()
            .filter(|cat| cat.as_str() == req || cat.starts_with(&format!("{}/", req)))
            .collect();
        if matches.is_empty() {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for cat in matches {
            filtered.insert(cat.clone(), all[cat].clone());
        }
    }

    if filtered.is_empty() { None } else { Some(filtered) }
}
