//! Textual repairs applied after generic serialization.
//!
//! The consuming application trims whitespace-only element text and expects
//! the XML Schema instance namespace on every grid root. Both repairs are
//! idempotent, so running them over already-repaired output changes nothing.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

pub const XSI_NAMESPACE: &str = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;
const XSI_PREFIX: &str = "xmlns:xsi";
const CDATA_SPACE: &str = "<![CDATA[ ]]>";

fn space_element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<([A-Za-z_][\w.:-]*)(\s[^<>]*)?> </([A-Za-z_][\w.:-]*)>")
            .expect("static pattern")
    })
}

pub fn apply(xml: &str) -> String {
    ensure_xsi_namespace(&preserve_space_text(xml))
}

/// `<Caption> </Caption>` → `<Caption><![CDATA[ ]]></Caption>`
pub fn preserve_space_text(xml: &str) -> String {
    space_element_pattern()
        .replace_all(xml, |caps: &Captures| {
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            if caps[1] != caps[3] || attrs.ends_with('/') {
                return caps[0].to_string();
            }
            format!("<{}{}>{}</{}>", &caps[1], attrs, CDATA_SPACE, &caps[3])
        })
        .into_owned()
}

/// Adds the `xmlns:xsi` declaration to the root start tag when missing.
pub fn ensure_xsi_namespace(xml: &str) -> String {
    let Some(tag) = root_start_tag(xml) else {
        return xml.to_string();
    };
    if xml[tag.clone()].contains(XSI_PREFIX) {
        return xml.to_string();
    }

    let name_end = xml[tag.start + 1..tag.end]
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map(|offset| tag.start + 1 + offset)
        .unwrap_or(tag.end);

    let mut fixed = String::with_capacity(xml.len() + XSI_NAMESPACE.len() + 1);
    fixed.push_str(&xml[..name_end]);
    fixed.push(' ');
    fixed.push_str(XSI_NAMESPACE);
    fixed.push_str(&xml[name_end..]);
    fixed
}

/// Byte range of the root element's start tag, skipping the declaration,
/// processing instructions, comments and doctype.
fn root_start_tag(xml: &str) -> Option<Range<usize>> {
    let mut pos = 0;
    while let Some(offset) = xml[pos..].find('<') {
        let start = pos + offset;
        let rest = &xml[start..];

        if rest.starts_with("<!--") {
            pos = start + rest.find("-->")? + 3;
        } else if rest.starts_with("<?") {
            pos = start + rest.find("?>")? + 2;
        } else if rest.starts_with("<!") {
            pos = start + rest.find('>')? + 1;
        } else if rest[1..].starts_with(|c: char| c.is_alphabetic() || c == '_') {
            let end = start + rest.find('>')? + 1;
            return Some(start..end);
        } else {
            pos = start + 1;
        }
    }
    None
}
