use super::strip_bom;
use crate::error::{GfResult, GridForgeError};
use crate::keys::KeyId;
use crate::layers::LayerId;
use crate::mapping::LayoutMapping;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::debug;

const PREFERRED_ENCODING: &str = "unicode";

enum LayerState {
    Outside,
    Known(LayerId),
    Unknown,
}

/// Parses a visual-keyboard document:
///
/// ```xml
/// <visualkeyboard>
///   <header><kbdname>greek</kbdname></header>
///   <encoding name="unicode">
///     <layer shift="S"><key vkey="K_A">Α</key></layer>
///   </encoding>
/// </visualkeyboard>
/// ```
///
/// Documents may carry one `<encoding>` per character set; the unicode one
/// wins when present.
pub fn parse(raw: &[u8]) -> GfResult<(Option<String>, LayoutMapping)> {
    let text = std::str::from_utf8(strip_bom(raw))
        .map_err(|e| malformed(format!("document is not UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(text);
    let mut buf = Vec::new();

    let mut by_encoding: BTreeMap<String, LayoutMapping> = BTreeMap::new();
    let mut encoding = String::new();
    let mut layer = LayerState::Outside;
    let mut key: Option<(KeyId, String)> = None;

    let mut name: Option<String> = None;
    let mut in_name = false;

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                seen_root = true;
                match e.name().as_ref() {
                    b"encoding" => encoding = attr(e, b"name")?.unwrap_or_default(),
                    b"layer" => {
                        layer = open_layer(e)?;
                        if let LayerState::Known(id) = layer {
                            by_encoding.entry(encoding.clone()).or_default().ensure_layer(id);
                        }
                    }
                    b"key" => {
                        if let LayerState::Known(_) = layer {
                            key = key_id(e)?.map(|id| (id, String::new()));
                        }
                    }
                    b"kbdname" | b"name" if name.is_none() => in_name = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                seen_root = true;
                match e.name().as_ref() {
                    b"layer" => {
                        if let LayerState::Known(id) = open_layer(e)? {
                            by_encoding.entry(encoding.clone()).or_default().ensure_layer(id);
                        }
                    }
                    b"key" => {
                        // <key vkey="K_X"/> explicitly maps to nothing
                        if let (LayerState::Known(id), Some(vkey)) = (&layer, key_id(e)?) {
                            by_encoding
                                .entry(encoding.clone())
                                .or_default()
                                .insert(*id, vkey, "");
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if key.is_some() || in_name {
                    let content = e.unescape().map_err(|err| {
                        malformed(format!("at byte {}: {}", reader.buffer_position(), err))
                    })?;
                    if let Some((_, value)) = key.as_mut() {
                        value.push_str(&content);
                    } else {
                        name.get_or_insert_with(String::new).push_str(&content);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some((_, value)) = key.as_mut() {
                    value.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"key" => {
                        if let (LayerState::Known(id), Some((vkey, value))) = (&layer, key.take()) {
                            by_encoding
                                .entry(encoding.clone())
                                .or_default()
                                .insert(*id, vkey, value);
                        }
                    }
                    b"layer" => layer = LayerState::Outside,
                    b"encoding" => encoding.clear(),
                    b"kbdname" | b"name" => in_name = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(malformed("document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(malformed(format!(
            "{} element(s) left unclosed at end of document",
            depth
        )));
    }

    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    Ok((name, select_encoding(by_encoding)))
}

fn select_encoding(mut by_encoding: BTreeMap<String, LayoutMapping>) -> LayoutMapping {
    if let Some(preferred) = by_encoding.remove(PREFERRED_ENCODING) {
        if !preferred.is_empty() {
            return preferred;
        }
    }
    by_encoding
        .into_values()
        .find(|mapping| !mapping.is_empty())
        .unwrap_or_default()
}

fn open_layer(e: &BytesStart) -> GfResult<LayerState> {
    let shift = attr(e, b"shift")?.unwrap_or_default();
    Ok(match LayerId::from_shift(&shift) {
        Some(id) => LayerState::Known(id),
        None => {
            debug!("Skipping layer with unknown shift state '{}'", shift);
            LayerState::Unknown
        }
    })
}

fn key_id(e: &BytesStart) -> GfResult<Option<KeyId>> {
    let vkey = attr(e, b"vkey")?;
    if vkey.is_none() {
        debug!("Skipping key without a vkey attribute");
    }
    Ok(vkey.as_deref().and_then(KeyId::from_token))
}

fn attr(e: &BytesStart, name: &[u8]) -> GfResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(format!("attribute error: {}", err)))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| malformed(format!("attribute error: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn malformed(reason: String) -> GridForgeError {
    GridForgeError::ParseMalformed(reason)
}
