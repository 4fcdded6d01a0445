//! `${...}` placeholder resolution.
//!
//! Responsibilities:
//! - Substitute `${key}` and `${key:default}` placeholders in a string,
//!   looking keys up through a caller-supplied function.
//! - Resolve nested placeholders in keys, defaults, and resolved values.
//!
//! Does NOT handle:
//! - Property lookup itself (the caller supplies the lookup closure).
//!
//! Invariants:
//! - Unresolvable placeholders without a default are left verbatim.
//! - Resolution depth is bounded; a reference cycle stops expanding instead
//!   of erroring or looping.

const PLACEHOLDER_PREFIX: &str = "${";
const PLACEHOLDER_SUFFIX: char = '}';
const DEFAULT_SEPARATOR: char = ':';
const MAX_DEPTH: usize = 8;

/// Resolve all placeholders in `text` using `lookup` for key resolution.
pub fn resolve<F>(text: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    resolve_at_depth(text, lookup, 0)
}

fn resolve_at_depth<F>(text: &str, lookup: &F, depth: usize) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if depth >= MAX_DEPTH || !text.contains(PLACEHOLDER_PREFIX) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        out.push_str(&rest[..start]);
        let after_prefix = &rest[start + PLACEHOLDER_PREFIX.len()..];
        match matching_suffix(after_prefix) {
            Some(end) => {
                let raw = &after_prefix[..end];
                let inner = resolve_at_depth(raw, lookup, depth + 1);
                let (key, default) = match inner.split_once(DEFAULT_SEPARATOR) {
                    Some((key, default)) => (key.to_string(), Some(default.to_string())),
                    None => (inner, None),
                };
                match lookup(&key) {
                    Some(value) => out.push_str(&resolve_at_depth(&value, lookup, depth + 1)),
                    None => match default {
                        Some(default) => out.push_str(&default),
                        // Leave the original placeholder text untouched.
                        None => {
                            out.push_str(PLACEHOLDER_PREFIX);
                            out.push_str(raw);
                            out.push(PLACEHOLDER_SUFFIX);
                        }
                    },
                }
                rest = &after_prefix[end + PLACEHOLDER_SUFFIX.len_utf8()..];
            }
            None => {
                // Unterminated placeholder; emit the rest as-is.
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Find the suffix matching the placeholder opened just before `text`,
/// accounting for nested `${...}` occurrences. Byte-wise scan is safe: the
/// delimiters are ASCII and never occur inside multi-byte sequences.
fn matching_suffix(text: &str) -> Option<usize> {
    let mut nesting = 0usize;
    let mut index = 0usize;
    let bytes = text.as_bytes();
    while index < bytes.len() {
        if bytes[index] == b'$' && index + 1 < bytes.len() && bytes[index + 1] == b'{' {
            nesting += 1;
            index += 2;
        } else if bytes[index] == b'}' {
            if nesting == 0 {
                return Some(index);
            }
            nesting -= 1;
            index += 1;
        } else {
            index += 1;
        }
    }
    None
}
