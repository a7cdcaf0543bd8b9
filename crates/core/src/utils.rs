//! Common naming and text helpers for TypeScript code generation.
//!
//! Everything that turns OpenAPI names into TypeScript identifiers lives here so the
//! registry, the emitters and the extractor agree on the same spelling.

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Suffix appended to the name of an inline enum, allOf or union position.
pub const ENUM_SUFFIX: &str = "Enum";

/// Converts an arbitrary name into lower camel case.
///
/// Letters are kept, digits are kept only once something has been written, and every other
/// character is dropped. Any dropped character or digit makes the next letter uppercase.
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut had_symbol = false;
    for c in name.chars() {
        if c.is_ascii_alphabetic() {
            if had_symbol {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            had_symbol = false;
        } else if c.is_ascii_digit() {
            if !out.is_empty() {
                out.push(c);
                had_symbol = true;
            }
        } else if !out.is_empty() {
            had_symbol = true;
        }
    }
    out
}

/// Converts an arbitrary name into an upper camel case identifier.
pub fn identifier(name: &str) -> String {
    capitalize_first(&camelize(name))
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Returns true for references that point inside the current document.
pub fn is_internal_ref(reference: &str) -> bool {
    reference.starts_with('#')
}

/// Splits an internal JSON pointer reference into decoded tokens.
///
/// Each segment is percent-decoded first, then `~1` becomes `/` and `~0` becomes `~`.
pub fn decode_ref_tokens(reference: &str) -> Vec<String> {
    let pointer = reference.strip_prefix('#').unwrap_or(reference);
    pointer
        .split('/')
        .skip(1)
        .map(|segment| percent_decode(segment).replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// The declaration name a reference resolves to: the identifier of its last token.
pub fn ref_name(reference: &str) -> String {
    decode_ref_tokens(reference)
        .last()
        .map(|token| identifier(token))
        .unwrap_or_default()
}

/// Invalid UTF-8 after decoding keeps the segment as written.
fn percent_decode(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map_or_else(|_| segment.to_string(), |decoded| decoded.into_owned())
}

/// Trims the text and drops it when nothing is left.
pub fn non_empty_string(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Renders a doc comment block, or nothing when there is no text.
///
/// ```text
/// /**
/// * first line
/// * second line
/// */
/// ```
pub fn to_comment(text: Option<&str>) -> String {
    let Some(text) = non_empty_string(text) else {
        return String::new();
    };
    let mut comment = String::from("/**\n");
    for line in text.lines() {
        comment.push_str("* ");
        comment.push_str(&line.replace("*/", "*\\/"));
        comment.push('\n');
    }
    comment.push_str("*/\n");
    comment
}

/// Name given to an inline enum/allOf/union living under `parent`.
pub fn enum_child_name(parent: &str) -> String {
    if parent.ends_with(ENUM_SUFFIX) {
        parent.to_string()
    } else {
        format!("{parent}{ENUM_SUFFIX}")
    }
}

/// Escape a string for use in JavaScript/TypeScript string literals.
/// Escapes backslashes and double quotes.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Double-quoted property key, e.g. `"x-trace-id"`.
pub fn quote_key(name: &str) -> String {
    format!("\"{}\"", escape_js_string(name))
}

/// Renders a JSON value as a TypeScript literal.
pub fn json_literal(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
