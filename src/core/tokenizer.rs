//! Splits a command line into whitespace separated tokens.

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n'
}

/// Splits `line` into its non-empty tokens.
///
/// Tokens are separated by runs of spaces, tabs and newlines. There is no
/// quoting, escaping or comment handling. The returned tokens borrow from
/// `line`, so the buffer must outlive every use of them.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(is_separator).filter(|t| !t.is_empty()).collect()
}
