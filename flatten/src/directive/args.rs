/// The `args:` sub-block attached to an include directive, kept as opaque
/// text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgsBlock<'a> {
    pub lines: Vec<&'a str>,
    /// Index of the first collected line in the document.
    pub start: usize,
    /// True when collection ran to end of document without a dedent.
    pub unterminated: bool,
}

impl ArgsBlock<'_> {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Collect the args block that may follow a directive at `start - 1`.
///
/// Returns the index of the first line not consumed together with the
/// block. Only a first line whose trimmed content starts with `args:`
/// opens a block; sibling list items and further directives are never
/// swallowed in well-formed input.
pub fn collect_args<'a>(lines: &[&'a str], start: usize, indent: &str) -> (usize, ArgsBlock<'a>) {
    let mut block = ArgsBlock {
        start,
        ..ArgsBlock::default()
    };

    let opens = lines
        .get(start)
        .is_some_and(|line| is_continuation(line, indent) && line.trim_start().starts_with("args:"));
    if !opens {
        return (start, block);
    }

    let mut next = start;
    while next < lines.len() && is_continuation(lines[next], indent) {
        block.lines.push(lines[next]);
        next += 1;
    }
    block.unterminated = next == lines.len();
    (next, block)
}

/// A non-blank line indented past `indent` by at least one more
/// whitespace character.
fn is_continuation(line: &str, indent: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    line.strip_prefix(indent)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}
