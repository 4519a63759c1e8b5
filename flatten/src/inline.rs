use std::sync::LazyLock;

use regex::Regex;

/// A first line shaped like a mapping entry: `name:`, `"quoted-key":`.
static KEYED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*[\w\-"']+\s*:"#).expect("keyed line regex is valid"));

/// How a fragment was spliced into its parent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentShape {
    /// First content line became the list item's inline key.
    Keyed,
    /// Whole fragment wrapped in a literal block scalar.
    Literal,
}

/// Output lines for one inlined fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inlined {
    pub shape: FragmentShape,
    pub lines: Vec<String>,
}

/// Splice `fragment` (already whitespace-normalized) as a list item at
/// `indent`.
pub fn inline_fragment(fragment: &str, indent: &str) -> Inlined {
    let body = fragment.strip_suffix('\n').unwrap_or(fragment);
    let lines: Vec<&str> = body.split('\n').collect();
    let nested = indent.chars().count() + 2;

    let first_idx = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let first_line = lines.get(first_idx).copied().unwrap_or("");

    if KEYED_LINE.is_match(first_line) {
        let mut out = vec![format!("{}- {}", indent, first_line.trim())];
        let rest = lines.get(first_idx + 1..).unwrap_or(&[]);
        if rest.iter().any(|line| !line.trim().is_empty()) {
            out.extend(indent_lines(rest, nested));
        }
        Inlined {
            shape: FragmentShape::Keyed,
            lines: out,
        }
    } else {
        // A literal block carries the fragment from its first character,
        // leading blank lines included.
        let mut out = vec![format!("{}- |", indent)];
        out.extend(indent_lines(&lines, nested));
        Inlined {
            shape: FragmentShape::Literal,
            lines: out,
        }
    }
}

/// Prefix every non-empty line with `spaces` spaces; empty lines stay empty.
pub fn indent_lines(lines: &[&str], spaces: usize) -> Vec<String> {
    let pad = " ".repeat(spaces);
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_fragment_becomes_list_item() {
        let inlined = inline_fragment("name: x\nvalue: 1", "  ");
        assert_eq!(inlined.shape, FragmentShape::Keyed);
        assert_eq!(inlined.lines, vec!["  - name: x", "    value: 1"]);
    }

    #[test]
    fn keyed_fragment_keeps_relative_indent_and_blank_lines() {
        let inlined = inline_fragment("\n\nstep:\n  id: 1\n\n  type: db\n", "");
        assert_eq!(
            inlined.lines,
            vec!["- step:", "    id: 1", "", "    type: db"]
        );
    }

    #[test]
    fn single_line_keyed_fragment() {
        let inlined = inline_fragment("name: only\n\n", "    ");
        assert_eq!(inlined.lines, vec!["    - name: only"]);
    }

    #[test]
    fn quoted_and_hyphenated_keys_are_keyed() {
        assert_eq!(inline_fragment("\"my-key\": 1", "").shape, FragmentShape::Keyed);
        assert_eq!(inline_fragment("'k': 1", "").shape, FragmentShape::Keyed);
        assert_eq!(inline_fragment("step-id : 7", "").shape, FragmentShape::Keyed);
    }

    #[test]
    fn list_fragment_becomes_literal_block() {
        let inlined = inline_fragment("- a\n- b", "");
        assert_eq!(inlined.shape, FragmentShape::Literal);
        assert_eq!(inlined.lines, vec!["- |", "  - a", "  - b"]);
    }

    #[test]
    fn literal_block_keeps_leading_blank_lines() {
        let inlined = inline_fragment("\n# comment\nkey: v\n", "  ");
        assert_eq!(
            inlined.lines,
            vec!["  - |", "", "    # comment", "    key: v"]
        );
    }

    #[test]
    fn blank_fragment_is_empty_literal() {
        let inlined = inline_fragment("", "");
        assert_eq!(inlined.shape, FragmentShape::Literal);
        assert_eq!(inlined.lines, vec!["- |", ""]);
    }

    #[test]
    fn indent_lines_skips_empty() {
        assert_eq!(indent_lines(&["a", "", " b"], 2), vec!["  a", "", "   b"]);
    }
}
