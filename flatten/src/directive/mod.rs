pub mod args;

use std::sync::LazyLock;

use regex::Regex;

/// A list item introducing an external fragment: `- !include <target>`.
/// A leading `file:` is swallowed here; the sanitizer handles the rest.
static INCLUDE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)-\s*!include\s+(?:file:\s*)?(.+?)\s*$").expect("include regex is valid")
});

/// An include directive recognized on a single document line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective<'a> {
    /// Leading whitespace before the list dash.
    pub indent: &'a str,
    /// Everything after the keyword, unsanitized.
    pub raw_target: &'a str,
}

impl<'a> IncludeDirective<'a> {
    /// Recognize a directive line. Returns `None` for any other line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = INCLUDE_LINE.captures(line)?;
        Some(IncludeDirective {
            indent: caps.get(1).map_or("", |m| m.as_str()),
            raw_target: caps.get(2).map_or("", |m| m.as_str()),
        })
    }
}
