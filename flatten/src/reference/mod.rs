pub mod resolve;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A path-like run ending in a fragment file extension.
static FRAGMENT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\.ya?ml").expect("fragment path regex is valid"));

const SCHEME_PREFIX: &str = "file:";

/// Closing punctuation that trails references copied out of prose or flow
/// sequences.
const TRAILING_PUNCTUATION: &[char] = &[')', ',', ';', ']', '}'];

/// A cleaned include target, relative to the base directory.
///
/// Never contains `#` or `?`, never starts with `file:` (any case) and never
/// ends in closing punctuation or whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedReference(String);

impl SanitizedReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean the raw text that follows `!include` on a directive line.
///
/// Drops the inline comment, the query suffix and any `file:` prefix. When
/// junk surrounds the path, the longest run ending in `.yaml`/`.yml` wins.
/// Never fails: an unusable input yields an unusable (possibly empty) path.
pub fn sanitize(raw: &str) -> SanitizedReference {
    let mut s = raw.trim();
    if let Some(pos) = s.find('#') {
        s = s[..pos].trim();
    }
    if let Some(pos) = s.find('?') {
        s = s[..pos].trim();
    }
    s = strip_scheme(s);

    if let Some(anchored) = longest_fragment_path(s) {
        s = strip_scheme(anchored);
    }

    let s = s.trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c));
    SanitizedReference(s.to_string())
}

fn strip_scheme(mut s: &str) -> &str {
    while s
        .get(..SCHEME_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SCHEME_PREFIX))
    {
        s = s[SCHEME_PREFIX.len()..].trim();
    }
    s
}

fn longest_fragment_path(s: &str) -> Option<&str> {
    // rev() so the first of several equally long matches wins
    FRAGMENT_PATH
        .find_iter(s)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .max_by_key(|m| m.len())
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(raw: &str) -> String {
        sanitize(raw).into_string()
    }

    #[test]
    fn strips_scheme_query_and_comment() {
        assert_eq!(clean("file: steps/a.yaml?v=2 # note"), "steps/a.yaml");
    }

    #[test]
    fn plain_path_untouched() {
        assert_eq!(clean("steps/validate.yaml"), "steps/validate.yaml");
        assert_eq!(clean("  steps/validate.yml  "), "steps/validate.yml");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(clean("FILE:steps/a.yaml"), "steps/a.yaml");
        assert_eq!(clean("File:  steps/a.yaml"), "steps/a.yaml");
    }

    #[test]
    fn repeated_scheme_is_stripped() {
        assert_eq!(clean("file: file:steps/a.yaml"), "steps/a.yaml");
    }

    #[test]
    fn trailing_punctuation_removed() {
        assert_eq!(clean("steps/a.yaml),"), "steps/a.yaml");
        assert_eq!(clean("steps/notes)"), "steps/notes");
        assert_eq!(clean("steps/notes ;"), "steps/notes");
    }

    #[test]
    fn path_recovered_from_junk() {
        assert_eq!(clean("see steps/a.yaml for details"), "steps/a.yaml");
        assert_eq!(clean("x file:steps/a.yaml"), "steps/a.yaml");
    }

    #[test]
    fn longest_anchored_match_wins() {
        assert_eq!(clean("a.yml steps/long/b.yaml"), "steps/long/b.yaml");
        assert_eq!(clean("a.yml b.yml"), "a.yml");
    }

    #[test]
    fn no_extension_keeps_remainder() {
        assert_eq!(clean("fragments/header"), "fragments/header");
    }

    #[test]
    fn comment_only_is_empty() {
        assert!(sanitize("# just a comment").is_empty());
        assert!(sanitize("?v=1").is_empty());
        assert!(sanitize("file:").is_empty());
    }

    #[test]
    fn invariants_and_idempotence() {
        let samples = [
            "file: steps/a.yaml?v=2 # note",
            "FILE:file: x.yml",
            "x file:steps/a.yaml",
            "some junk),",
            "a b c",
            "file:)",
            "steps/a.yaml?q=1#c",
            "  ",
            "dir with space/step.yaml",
            "weird\u{00A0}name.yaml",
        ];
        for raw in samples {
            let once = clean(raw);
            assert!(!once.contains('#'), "{:?} -> {:?}", raw, once);
            assert!(!once.contains('?'), "{:?} -> {:?}", raw, once);
            assert!(
                !once.to_ascii_lowercase().starts_with("file:"),
                "{:?} -> {:?}",
                raw,
                once
            );
            assert_eq!(clean(&once), once, "not idempotent for {:?}", raw);
        }
    }
}
