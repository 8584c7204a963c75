/// String escaping for inline SQL literals.

/// Escape a value for use inside a single-quoted SQL string literal.
///
/// Single quotes are doubled. NUL characters cannot appear in a statement
/// string and are dropped. The surrounding quotes are not added.
pub fn escape_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\'' => result.push_str("''"),
            '\0' => {}
            c => result.push(c),
        }
    }
    result
}

/// Escape a value and wrap it in single quotes.
#[inline]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_string(value))
}
