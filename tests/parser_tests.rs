mod common;

use common::{GREEK_KVKS, GREEK_SCRIPT};
use gridforge::error::GridForgeError;
use gridforge::keys::KeyId;
use gridforge::layers::LayerId;
use gridforge::parser::{parse_layout, LayoutFormat};
use rstest::rstest;

fn key(token: &str) -> KeyId {
    KeyId::from_token(token).unwrap()
}

// --- KEY IDENTIFIERS ---
#[rstest]
#[case("K_A", "k_a")]
#[case("k_a", "k_a")]
#[case("A", "k_a")]
#[case(" a ", "k_a")]
#[case("Space", "k_space")]
#[case("K_SPACE", "k_space")]
#[case("K_OEM_1", "k_oem_1")]
#[case(";", "k_colon")]
#[case("/", "k_slash")]
#[case("K", "k_k")]
#[case("k_", "k_k_")]
fn test_key_canonicalization(#[case] token: &str, #[case] expected: &str) {
    assert_eq!(key(token).as_str(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t")]
fn test_blank_tokens_have_no_identity(#[case] token: &str) {
    assert_eq!(KeyId::from_token(token), None);
}

// --- LAYER IDS ---
#[rstest]
#[case("", Some(LayerId::Base))]
#[case("default", Some(LayerId::Base))]
#[case("s", Some(LayerId::Shift))]
#[case("SC", Some(LayerId::ShiftCtrl))]
#[case("ra", Some(LayerId::Alt))]
#[case("SCA", Some(LayerId::ShiftCtrlAlt))]
#[case("LCTRL", None)]
fn test_shift_tokens(#[case] token: &str, #[case] expected: Option<LayerId>) {
    assert_eq!(LayerId::from_shift(token), expected);
}

// --- STRUCTURED ---
#[test]
fn test_structured_layers_and_name() {
    let def = parse_layout(GREEK_KVKS.as_bytes(), None).unwrap();
    assert_eq!(def.format, LayoutFormat::Structured);
    assert_eq!(def.name.as_deref(), Some("greek"));

    let base = def.mapping.base().unwrap();
    assert_eq!(base.get(&key("a")).map(String::as_str), Some("α"));
    assert_eq!(base.get(&key("q")).map(String::as_str), Some(";"));

    let shift = def.mapping.layer(LayerId::Shift).unwrap();
    assert_eq!(shift.get(&key("b")).map(String::as_str), Some("Β"));
    assert_eq!(def.mapping.key_count(), 5);
}

#[test]
fn test_structured_unknown_shift_is_ignored() {
    let xml = r#"<visualkeyboard><encoding name="unicode">
        <layer shift="XYZ"><key vkey="K_A">x</key></layer>
        <layer shift="RA"><key vkey="K_E">€</key></layer>
    </encoding></visualkeyboard>"#;
    let def = parse_layout(xml.as_bytes(), None).unwrap();

    assert_eq!(def.mapping.layers().count(), 1);
    let alt = def.mapping.layer(LayerId::Alt).unwrap();
    assert_eq!(alt.get(&key("K_E")).map(String::as_str), Some("€"));
}

#[test]
fn test_structured_empty_key_is_explicit_nothing() {
    let xml = r#"<visualkeyboard><encoding name="unicode"><layer shift="">
        <key vkey="K_A"/><key vkey="K_B"></key><key vkey="K_C">c</key><key vkey="K_C">ç</key>
    </layer></encoding></visualkeyboard>"#;
    let def = parse_layout(xml.as_bytes(), None).unwrap();
    let base = def.mapping.base().unwrap();

    assert_eq!(base.get(&key("a")), Some(&String::new()));
    assert_eq!(base.get(&key("b")), Some(&String::new()));
    // last entry wins
    assert_eq!(base.get(&key("c")).map(String::as_str), Some("ç"));
}

#[test]
fn test_structured_escapes_and_cdata() {
    let xml = r#"<visualkeyboard><encoding name="unicode"><layer shift="">
        <key vkey="K_A">&amp;</key><key vkey="K_B"><![CDATA[<]]></key>
    </layer></encoding></visualkeyboard>"#;
    let def = parse_layout(xml.as_bytes(), None).unwrap();
    let base = def.mapping.base().unwrap();

    assert_eq!(base.get(&key("a")).map(String::as_str), Some("&"));
    assert_eq!(base.get(&key("b")).map(String::as_str), Some("<"));
}

#[rstest]
#[case("<visualkeyboard><layer shift=\"\"><key vkey=\"K_A\">a</layer></visualkeyboard>")]
#[case("<visualkeyboard><encoding>")]
#[case("<visualkeyboard><key vkey=\"K_A>a</key></visualkeyboard>")]
fn test_structured_malformed_is_rejected(#[case] xml: &str) {
    let err = parse_layout(xml.as_bytes(), Some(LayoutFormat::Structured)).unwrap_err();
    assert!(matches!(err, GridForgeError::ParseMalformed(_)), "{err}");
}

#[test]
fn test_structured_rejects_text_without_root() {
    let err = parse_layout(b"just text", Some(LayoutFormat::Structured)).unwrap_err();
    assert!(matches!(err, GridForgeError::ParseMalformed(_)));
}

// --- EMBEDDED LITERAL ---
#[test]
fn test_embedded_default_list_fills_alphabet() {
    let def = parse_layout(GREEK_SCRIPT.as_bytes(), None).unwrap();
    assert_eq!(def.format, LayoutFormat::EmbeddedLiteral);
    assert_eq!(def.name.as_deref(), Some("Greek (JS)"));

    let base = def.mapping.base().unwrap();
    assert_eq!(base.len(), 6);
    assert_eq!(base.get(&key("a")).map(String::as_str), Some("α"));
    assert_eq!(base.get(&key("f")).map(String::as_str), Some("φ"));
    assert_eq!(base.get(&key("g")), None);
    assert!(def.mapping.layer(LayerId::Shift).is_none());
}

#[test]
fn test_embedded_falls_back_to_first_list() {
    let script = r#"this.KV.KLS={'shift':['X','Y']};"#;
    let def = parse_layout(script.as_bytes(), None).unwrap();
    let base = def.mapping.base().unwrap();
    assert_eq!(base.get(&key("a")).map(String::as_str), Some("X"));
    assert_eq!(base.get(&key("b")).map(String::as_str), Some("Y"));
}

#[test]
fn test_embedded_extra_strings_are_dropped() {
    let values: Vec<String> = (0..30).map(|i| format!("\"v{}\"", i)).collect();
    let script = format!("KLS={{\"default\":[{}]}}", values.join(","));
    let def = parse_layout(script.as_bytes(), None).unwrap();
    let base = def.mapping.base().unwrap();

    assert_eq!(base.len(), 26);
    assert_eq!(base.get(&key("z")).map(String::as_str), Some("v25"));
}

#[rstest]
#[case("")]
#[case("function Keyboard_x(){ this.KV={}; }")]
#[case("this.KV.KLS={\"default\":[\"a\",\"b\"")]
#[case("this.KV.KLS={}")]
#[case("\u{0}\u{1}garbage{[")]
fn test_embedded_malformed_degrades_to_empty(#[case] script: &str) {
    let def = parse_layout(script.as_bytes(), Some(LayoutFormat::EmbeddedLiteral)).unwrap();
    assert!(def.mapping.is_empty());
}
