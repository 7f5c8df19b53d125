//! Heuristic scan of compiled keyboard scripts.
//!
//! Compiled keyboards carry their visual key strings as an object literal
//! assigned to `KLS`, one string list per layer:
//!
//! ```js
//! this.KV.KLS={"default":["α","β","ψ", ...],"shift":["Α","Β", ...]};
//! ```
//!
//! This is a text scan, not a parse. Anything unrecognizable degrades to an
//! empty or partial mapping instead of an error.

use crate::keys::alphabet;
use crate::layers::LayerId;
use crate::mapping::LayoutMapping;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

const BASE_LIST: &str = "default";

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bKLS\s*[=:]\s*\{").expect("static pattern"))
}

fn list_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""([^"\\]*)"\s*:\s*\[|'([^'\\]*)'\s*:\s*\["#).expect("static pattern")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\bKN\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static pattern")
    })
}

pub fn parse(raw: &[u8]) -> (Option<String>, LayoutMapping) {
    let text = String::from_utf8_lossy(raw);
    let name = keyboard_name(&text);
    let mut mapping = LayoutMapping::new();

    let Some(body) = layer_strings_body(&text) else {
        warn!("No key string literal found in keyboard script; mapping is empty");
        return (name, mapping);
    };

    let lists = key_lists(body);
    let values = lists
        .iter()
        .find(|(list_name, _)| list_name == BASE_LIST)
        .or_else(|| lists.first())
        .map(|(_, values)| values);

    let Some(values) = values else {
        warn!("Key string literal holds no key lists; mapping is empty");
        return (name, mapping);
    };

    if values.len() > 26 {
        debug!("Discarding {} key strings beyond 'z'", values.len() - 26);
    }

    for (key, value) in alphabet().zip(values.iter()) {
        mapping.insert(LayerId::Base, key, value.clone());
    }

    (name, mapping)
}

fn keyboard_name(text: &str) -> Option<String> {
    let caps = name_pattern().captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Body between the braces of the `KLS` object literal.
fn layer_strings_body(text: &str) -> Option<&str> {
    let found = assignment_pattern().find(text)?;
    let open = found.end() - 1;
    let close = matching_close(text, open, b'{', b'}')?;
    Some(&text[open + 1..close])
}

/// Every balanced `"name": [ ... ]` list, in source order. Scanning stops at
/// the first list that never closes.
fn key_lists(body: &str) -> Vec<(String, Vec<String>)> {
    let mut lists = Vec::new();
    let mut pos = 0;

    while let Some(caps) = list_pattern().captures(&body[pos..]) {
        let Some(whole) = caps.get(0) else { break };
        let list_name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let open = pos + whole.end() - 1;
        let Some(close) = matching_close(body, open, b'[', b']') else {
            debug!("Key list '{}' never closes", list_name);
            break;
        };

        lists.push((list_name, string_literals(&body[open + 1..close])));
        pos = close + 1;
    }

    lists
}

/// Index of the bracket closing the one at `open`, skipping quoted text.
fn matching_close(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == open_ch => depth += 1,
            None if b == close_ch => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            None => {}
        }
        i += 1;
    }
    None
}

/// Decoded string literals of a list body; other entries are ignored.
fn string_literals(list: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = list.chars();

    while let Some(c) = chars.next() {
        if c != '"' && c != '\'' {
            continue;
        }
        let mut value = String::new();
        let mut closed = false;
        while let Some(next) = chars.next() {
            if next == c {
                closed = true;
                break;
            }
            if next == '\\' {
                decode_escape(&mut chars, &mut value);
            } else {
                value.push(next);
            }
        }
        if !closed {
            break;
        }
        values.push(value);
    }

    values
}

fn decode_escape(chars: &mut std::str::Chars<'_>, out: &mut String) {
    let Some(c) = chars.next() else { return };
    match c {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '0' => out.push('\0'),
        'x' => {
            if let Some(ch) = read_hex(chars, 2).and_then(char::from_u32) {
                out.push(ch);
            }
        }
        'u' => {
            let Some(unit) = read_hex(chars, 4) else { return };
            if (0xD800..0xDC00).contains(&unit) {
                // high surrogate: expect a `\uDC00`-range partner
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                    if let Some(low) = read_hex(&mut lookahead, 4) {
                        if (0xDC00..0xE000).contains(&low) {
                            let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                            if let Some(ch) = char::from_u32(combined) {
                                out.push(ch);
                                *chars = lookahead;
                                return;
                            }
                        }
                    }
                }
                out.push(char::REPLACEMENT_CHARACTER);
            } else if let Some(ch) = char::from_u32(unit) {
                out.push(ch);
            }
        }
        other => out.push(other),
    }
}

fn read_hex(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_close_skips_quoted_brackets() {
        let text = r#"{"a": ["]", "}"], "b": []}"#;
        assert_eq!(matching_close(text, 0, b'{', b'}'), Some(text.len() - 1));
    }

    #[test]
    fn test_string_literal_escapes() {
        let values = string_literals(r#""\u03b1", '\'', "\\", "\ud83d\ude00", 0, "x""#);
        assert_eq!(values, vec!["α", "'", "\\", "😀", "x"]);
    }

    #[test]
    fn test_key_lists_in_order() {
        let lists = key_lists(r#""shift":["A","B"],"default":["a","b"]"#);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].0, "shift");
        assert_eq!(lists[1].1, vec!["a", "b"]);
    }

    #[test]
    fn test_unclosed_list_stops_scan() {
        let lists = key_lists(r#""default":["a","b""#);
        assert!(lists.is_empty());
    }
}
