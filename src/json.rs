//! Lazy walker over externally-supplied JSON text. Nothing here builds a
//! tree: every lookup re-scans the raw bytes and hands back the sub-slice
//! holding the requested value, so host JSON is only ever paid for where
//! an expression actually reaches into it.

use crate::arena::Arena;
use crate::error::Error;
use crate::scan::push_codepoint;
use crate::value::Value;

fn skip_ws(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && (b[i] == b' ' || b[i] == b'\t' || b[i] == b'\n' || b[i] == b'\r') {
        i += 1;
    }
    i
}

// Index just past the string opening at `start`, or None if it never
// closes. A backslash always consumes the following byte.
fn string_end(b: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < b.len() {
        match b[i] {
            b'"' => return Some(i + 1),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

// Index just past the value starting at `start` (which must not be
// whitespace). Containers are skipped by depth counting; literals and
// numbers run until a delimiter.
fn value_end(b: &[u8], start: usize) -> Option<usize> {
    match b[start] {
        b'"' => string_end(b, start),
        b'{' | b'[' => {
            let mut depth = 0;
            let mut i = start;
            while i < b.len() {
                match b[i] {
                    b'"' => {
                        i = string_end(b, i)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut i = start;
            while i < b.len() {
                match b[i] {
                    b',' | b']' | b'}' | b':' => break,
                    c if c == b' ' || c == b'\t' || c == b'\n' || c == b'\r' => break,
                    _ => i += 1,
                }
            }
            if i == start {
                None
            } else {
                Some(i)
            }
        }
    }
}

// Tolerant unescape of JSON string content; malformed trailing escapes
// are dropped rather than faulted, since host JSON is not ours to reject.
fn unescape_into(content: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < content.len() {
        if content[i] != b'\\' {
            out.push(content[i]);
            i += 1;
            continue;
        }
        i += 1;
        if i == content.len() {
            break;
        }
        match content[i] {
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                if content.len() - i < 5 {
                    break;
                }
                let mut cp = 0u32;
                for &c in &content[i + 1..i + 5] {
                    cp = cp << 4
                        | match c {
                            b'0'..=b'9' => (c - b'0') as u32,
                            b'a'..=b'f' => (c + 10 - b'a') as u32,
                            b'A'..=b'F' => (c + 10 - b'A') as u32,
                            _ => 0,
                        };
                }
                i += 4;
                if (0xD800..0xDC00).contains(&cp)
                    && content.len() - i > 6
                    && content[i + 1] == b'\\'
                    && content[i + 2] == b'u'
                {
                    let mut low = 0u32;
                    for &c in &content[i + 3..i + 7] {
                        low = low << 4
                            | match c {
                                b'0'..=b'9' => (c - b'0') as u32,
                                b'a'..=b'f' => (c + 10 - b'a') as u32,
                                b'A'..=b'F' => (c + 10 - b'A') as u32,
                                _ => 0,
                            };
                    }
                    if (0xDC00..0xE000).contains(&low) {
                        cp = (((cp - 0xD800) << 10) | (low - 0xDC00)) + 0x10000;
                        i += 6;
                    }
                }
                push_codepoint(out, cp);
            }
            c => out.push(c),
        }
        i += 1;
    }
}

fn unescape_string<'a>(arena: &'a Arena, content: &str) -> Option<&'a str> {
    let mut out = Vec::with_capacity(content.len());
    unescape_into(content.as_bytes(), &mut out);
    // Same argument as the literal unescaper: escapes are ASCII, raw runs
    // are intact UTF-8, push_codepoint emits valid scalar values.
    arena.alloc_str(unsafe { std::str::from_utf8_unchecked(&out) })
}

/// Classify a raw JSON slice into an engine value. Scalars materialize
/// immediately; arrays and objects stay as raw text to be walked later.
/// Empty or unrecognizable input is `undefined`.
pub(crate) fn value_of<'a>(arena: &'a Arena, raw: &'a str) -> Value<'a> {
    let b = raw.as_bytes();
    let i = skip_ws(b, 0);
    if i == b.len() {
        return Value::Undefined;
    }
    match b[i] {
        b'"' => match string_end(b, i) {
            Some(end) => {
                let content = &raw[i + 1..end - 1];
                if content.as_bytes().contains(&b'\\') {
                    match unescape_string(arena, content) {
                        Some(s) => Value::Str(s),
                        None => Value::Error(Error::oom()),
                    }
                } else {
                    Value::Str(content)
                }
            }
            None => Value::Str(""),
        },
        b'{' | b'[' => {
            let end = value_end(b, i).unwrap_or_else(|| b.len());
            Value::Json(&raw[i..end])
        }
        b't' if raw[i..].starts_with("true") => Value::Bool(true),
        b'f' if raw[i..].starts_with("false") => Value::Bool(false),
        b'n' if raw[i..].starts_with("null") => Value::Null,
        _ => {
            let end = match value_end(b, i) {
                Some(end) => end,
                None => return Value::Undefined,
            };
            match raw[i..end].parse() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::Undefined,
            }
        }
    }
}

fn key_matches(raw_key: &str, key: &str) -> bool {
    if !raw_key.as_bytes().contains(&b'\\') {
        return raw_key == key;
    }
    let mut out = Vec::with_capacity(raw_key.len());
    unescape_into(raw_key.as_bytes(), &mut out);
    out == key.as_bytes()
}

/// Member of a raw JSON object by key, as a raw sub-slice.
pub(crate) fn member<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let b = raw.as_bytes();
    let mut i = skip_ws(b, 0);
    if i == b.len() || b[i] != b'{' {
        return None;
    }
    i = skip_ws(b, i + 1);
    while i < b.len() && b[i] == b'"' {
        let key_end = string_end(b, i)?;
        let raw_key = &raw[i + 1..key_end - 1];
        i = skip_ws(b, key_end);
        if i == b.len() || b[i] != b':' {
            return None;
        }
        i = skip_ws(b, i + 1);
        if i == b.len() {
            return None;
        }
        let val_end = value_end(b, i)?;
        if key_matches(raw_key, key) {
            return Some(&raw[i..val_end]);
        }
        i = skip_ws(b, val_end);
        if i == b.len() || b[i] != b',' {
            return None;
        }
        i = skip_ws(b, i + 1);
    }
    None
}

/// Element of a raw JSON array by index, as a raw sub-slice.
pub(crate) fn element(raw: &str, index: u64) -> Option<&str> {
    let b = raw.as_bytes();
    let mut i = skip_ws(b, 0);
    if i == b.len() || b[i] != b'[' {
        return None;
    }
    i = skip_ws(b, i + 1);
    let mut remaining = index;
    while i < b.len() && b[i] != b']' {
        let val_end = value_end(b, i)?;
        if remaining == 0 {
            return Some(&raw[i..val_end]);
        }
        remaining -= 1;
        i = skip_ws(b, val_end);
        if i == b.len() || b[i] != b',' {
            return None;
        }
        i = skip_ws(b, i + 1);
    }
    None
}

// Element without materializing, for the numeric coercion below.
fn element_to_f64(elem: &str) -> f64 {
    let b = elem.as_bytes();
    let i = skip_ws(b, 0);
    if i == b.len() {
        return std::f64::NAN;
    }
    match b[i] {
        b'"' => {
            let content = match string_end(b, i) {
                Some(end) => &elem[i + 1..end - 1],
                None => return std::f64::NAN,
            };
            if content.as_bytes().contains(&b'\\') {
                let mut out = Vec::with_capacity(content.len());
                unescape_into(content.as_bytes(), &mut out);
                crate::convert::str_to_f64(unsafe { std::str::from_utf8_unchecked(&out) })
            } else {
                crate::convert::str_to_f64(content)
            }
        }
        b'[' => array_to_f64(elem),
        b'{' => std::f64::NAN,
        b't' => 1.0,
        b'f' => 0.0,
        b'n' => 0.0,
        _ => elem[i..].parse().unwrap_or(std::f64::NAN),
    }
}

/// Numeric coercion of a raw JSON container: an empty array is 0, a
/// one-element array is that element's number, everything else is NaN.
pub(crate) fn array_to_f64(raw: &str) -> f64 {
    let b = raw.as_bytes();
    let i = skip_ws(b, 0);
    if i == b.len() || b[i] != b'[' {
        return std::f64::NAN;
    }
    let first = skip_ws(b, i + 1);
    if first < b.len() && b[first] == b']' {
        return 0.0;
    }
    let val_end = match value_end(b, first) {
        Some(end) => end,
        None => return std::f64::NAN,
    };
    let after = skip_ws(b, val_end);
    if after < b.len() && b[after] == b',' {
        return std::f64::NAN;
    }
    element_to_f64(&raw[first..val_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"name": {"first": "Janet", "last": "Anderson"}, "age": 37, "enc": "Big\nBot", "data": [1,true,false,null,{"a":1}]}"#;

    #[test]
    fn member_lookup() {
        assert_eq!(
            member(DOC, "name"),
            Some(r#"{"first": "Janet", "last": "Anderson"}"#)
        );
        assert_eq!(member(DOC, "age"), Some("37"));
        assert_eq!(member(DOC, "missing"), None);
        assert_eq!(member("[1,2]", "0"), None);
    }

    #[test]
    fn element_lookup() {
        let data = member(DOC, "data").unwrap();
        assert_eq!(element(data, 0), Some("1"));
        assert_eq!(element(data, 3), Some("null"));
        assert_eq!(element(data, 4), Some(r#"{"a":1}"#));
        assert_eq!(element(data, 5), None);
    }

    #[test]
    fn classification() {
        let arena = Arena::new();
        assert_eq!(value_of(&arena, "37").to_string(), "37");
        assert_eq!(value_of(&arena, " true").to_string(), "true");
        assert_eq!(value_of(&arena, "null").to_string(), "null");
        assert_eq!(value_of(&arena, "\"Janet\"").to_string(), "Janet");
        assert_eq!(value_of(&arena, "\"Big\\nBot\"").to_string(), "Big\nBot");
        assert_eq!(value_of(&arena, "").to_string(), "undefined");
        assert_eq!(value_of(&arena, "\"").to_string(), "");
        assert!(match value_of(&arena, "[1,2]") {
            Value::Json("[1,2]") => true,
            _ => false,
        });
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(array_to_f64("[]"), 0.0);
        assert_eq!(array_to_f64("[15]"), 15.0);
        assert_eq!(array_to_f64("[\"15\"]"), 15.0);
        assert_eq!(array_to_f64("[[15]]"), 15.0);
        assert!(array_to_f64("[1,2]").is_nan());
        assert!(array_to_f64("{}").is_nan());
    }
}
