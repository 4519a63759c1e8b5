/// Space variants that sneak into documents from editors and copy-paste.
const EXOTIC_SPACES: [char; 3] = [
    '\u{00A0}', // no-break space
    '\u{2007}', // figure space
    '\u{202F}', // narrow no-break space
];

/// Map exotic spaces to ASCII spaces and unify line endings to `\n`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            c if EXOTIC_SPACES.contains(&c) => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Full document clean-up: `normalize` plus trailing whitespace stripped
/// from every line.
pub fn normalize_document(text: &str) -> String {
    normalize(text)
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
