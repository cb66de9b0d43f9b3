//! CockroachDB identifier and literal rules.

use std::fmt::Write;

/// Longest identifier, in bytes, the destination accepts without truncation.
pub const MAX_IDENT_LEN: usize = 63;

/// Reserved keywords that cannot be used as bare identifiers.
/// Sorted for binary search.
const RESERVED_WORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "column",
    "concurrently",
    "constraint",
    "create",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "family",
    "fetch",
    "for",
    "foreign",
    "from",
    "grant",
    "group",
    "having",
    "in",
    "index",
    "initially",
    "intersect",
    "into",
    "lateral",
    "leading",
    "limit",
    "localtime",
    "localtimestamp",
    "not",
    "nothing",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "placing",
    "primary",
    "references",
    "returning",
    "select",
    "session_user",
    "some",
    "symmetric",
    "table",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "when",
    "where",
    "window",
    "with",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&word.to_ascii_lowercase().as_str())
        .is_ok()
}

/// Whether `name` must be double-quoted to survive unchanged.
///
/// Bare identifiers fold to lowercase in the destination, so anything with
/// uppercase letters is quoted too.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return true;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$') {
        return true;
    }
    is_reserved(name)
}

/// Render an identifier, quoting only when required.
pub fn quote_ident(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// Render a string literal.
///
/// Plain values use standard quoting. Values holding control characters or
/// backslashes use an escape string, which keeps the statement on one line and
/// reads back the same under MySQL escaping rules.
pub fn quote_string(value: &str) -> String {
    if !value.chars().any(|c| c.is_control() || c == '\\') {
        return format!("'{}'", value.replace('\'', "''"));
    }

    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("e'");
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() && (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render a byte string literal (`_binary '...'` in the source) as hex.
pub fn quote_bytes(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2 + 3);
    out.push_str("x'");
    for byte in value.bytes() {
        let _ = write!(out, "{:02x}", byte);
    }
    out.push('\'');
    out
}

/// Render a `0x...` hex literal as a byte string.
pub fn hex_literal(source: &str) -> String {
    let digits = &source[2..];
    if digits.len() % 2 == 1 {
        format!("x'0{}'", digits)
    } else {
        format!("x'{}'", digits)
    }
}

/// Shorten a generated name to fit the identifier limit, keeping room for
/// `reserve` extra bytes.
pub fn truncate_ident(name: &str, reserve: usize) -> &str {
    let limit = MAX_IDENT_LEN.saturating_sub(reserve);
    if name.len() <= limit {
        return name;
    }
    let mut end = limit;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
