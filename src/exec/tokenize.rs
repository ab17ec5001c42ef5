//! Splitting of free-form argument strings.
//!
//! Quoting follows a deliberately small subset of POSIX shell rules: single
//! and double quotes group whitespace, there are no escape sequences, and an
//! unterminated quote is accepted rather than rejected.

/// Split `input` into an argument vector.
///
/// - Runs of spaces, tabs and newlines outside quotes separate tokens.
/// - `'` and `"` open a quoted region that only the same character closes;
///   inside it, whitespace and the other quote character are literal.
/// - Quote boundaries are not token boundaries: `a"b"c` is one token `abc`.
/// - An unterminated quote keeps whatever was accumulated.
/// - Empty tokens are never produced, so `""` on its own yields nothing.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, ' ' | '\t' | '\n') => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}
