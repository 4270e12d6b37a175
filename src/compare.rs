use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::column_type::ColumnType;

fn integer_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?[0-9]+$").expect("valid integer pattern"))
}

fn float_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").expect("valid float pattern")
    })
}

/// Checks a cell against its column's declared type.
///
/// The empty string encodes NULL and satisfies every type; whether an empty
/// cell is acceptable at all is the NOT_NULL constraint's business, not the
/// type's. TEXT accepts anything.
pub fn is_valid_cell(value: &str, column_type: ColumnType) -> bool {
    if value.is_empty() {
        return true;
    }
    match column_type {
        ColumnType::Integer => integer_pattern().is_match(value),
        ColumnType::Float => float_pattern().is_match(value),
        ColumnType::Text => true,
    }
}

/// Type-aware ordering of two string-encoded values.
///
/// INTEGER and FLOAT operands are both parsed as floating-point numbers and
/// compared numerically; TEXT compares lexicographically. Returns `None`
/// when a numeric comparison is undecidable (an operand fails to parse,
/// e.g. a NULL cell) — the caller treats such rows as non-matching.
pub fn compare(a: &str, b: &str, column_type: ColumnType) -> Option<Ordering> {
    match column_type {
        ColumnType::Integer | ColumnType::Float => {
            let left: f64 = a.parse().ok()?;
            let right: f64 = b.parse().ok()?;
            left.partial_cmp(&right)
        }
        ColumnType::Text => Some(a.cmp(b)),
    }
}

/// LIKE-pattern matching: `%` matches zero or more characters, `_` matches
/// exactly one, everything else matches itself. The pattern must cover the
/// whole value.
pub fn matches_like(value: &str, pattern: &str) -> bool {
    let mut translated = String::with_capacity(pattern.len() * 2 + 2);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated).is_ok_and(|re| re.is_match(value))
}
