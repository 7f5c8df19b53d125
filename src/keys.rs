use serde::{Deserialize, Serialize};
use std::fmt;

pub const VKEY_PREFIX: &str = "k_";
pub const SPACE_KEY: &str = "k_space";

/// Bare symbols that template captions use for keys whose virtual-key
/// names are spelled out in layout definitions.
const SYMBOL_ALIASES: [(&str, &str); 11] = [
    ("`", "bkquote"),
    ("-", "hyphen"),
    ("=", "equal"),
    ("[", "lbrkt"),
    ("]", "rbrkt"),
    ("\\", "bkslash"),
    (";", "colon"),
    ("'", "quote"),
    (",", "comma"),
    (".", "period"),
    ("/", "slash"),
];

/// Canonical key identifier: lower-case, always carrying the `k_` prefix.
///
/// Layout definitions name keys by virtual key (`K_A`, `K_SPACE`) while
/// templates and script literals use the bare letter (`A`, `a`). Both
/// spellings resolve to the same identifier here, so lookups compare
/// plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Canonicalizes either naming convention. Blank tokens have no identity.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let lower = token.to_lowercase();
        if lower.len() > VKEY_PREFIX.len() && lower.starts_with(VKEY_PREFIX) {
            return Some(Self(lower));
        }

        let bare = SYMBOL_ALIASES
            .iter()
            .find(|(symbol, _)| *symbol == lower)
            .map(|(_, name)| (*name).to_string())
            .unwrap_or(lower);

        Some(Self(format!("{}{}", VKEY_PREFIX, bare)))
    }

    pub fn space() -> Self {
        Self(SPACE_KEY.to_string())
    }

    pub fn is_space(&self) -> bool {
        self.0 == SPACE_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `k_a` through `k_z`, the positional key order of script-literal layouts.
pub fn alphabet() -> impl Iterator<Item = KeyId> {
    ('a'..='z').map(|c| KeyId(format!("{}{}", VKEY_PREFIX, c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_conventions_meet() {
        assert_eq!(KeyId::from_token("K_A"), KeyId::from_token("a"));
        assert_eq!(KeyId::from_token("A").unwrap().as_str(), "k_a");
        assert_eq!(KeyId::from_token(" Space ").unwrap(), KeyId::space());
    }

    #[test]
    fn test_symbol_aliases() {
        assert_eq!(KeyId::from_token(",").unwrap().as_str(), "k_comma");
        assert_eq!(KeyId::from_token("K_COMMA").unwrap().as_str(), "k_comma");
    }

    #[test]
    fn test_blank_has_no_identity() {
        assert!(KeyId::from_token("").is_none());
        assert!(KeyId::from_token("   ").is_none());
    }

    #[test]
    fn test_alphabet_order() {
        let keys: Vec<KeyId> = alphabet().collect();
        assert_eq!(keys.len(), 26);
        assert_eq!(keys[0].as_str(), "k_a");
        assert_eq!(keys[25].as_str(), "k_z");
    }
}
