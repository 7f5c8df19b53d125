use crate::keys::KeyId;
use crate::layers::LayerId;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Key → replacement text for one layer. An empty replacement means the
/// layout explicitly produces nothing for that key.
pub type KeyMap = BTreeMap<KeyId, String>;

static EMPTY_KEYMAP: KeyMap = BTreeMap::new();

/// How layer information reaches the rewriter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, Display,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MappingMode {
    /// Every grid page is rewritten from the base layer.
    SingleLayer,
    /// Each grid page is rewritten from its own modifier layer.
    #[default]
    MultiLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutMapping {
    layers: BTreeMap<LayerId, KeyMap>,
}

impl LayoutMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same key replace earlier ones.
    pub fn insert(&mut self, layer: LayerId, key: KeyId, text: impl Into<String>) {
        self.layers.entry(layer).or_default().insert(key, text.into());
    }

    /// Registers a layer even when it ends up holding no keys.
    pub fn ensure_layer(&mut self, layer: LayerId) {
        self.layers.entry(layer).or_default();
    }

    pub fn layer(&self, layer: LayerId) -> Option<&KeyMap> {
        self.layers.get(&layer)
    }

    pub fn base(&self) -> Option<&KeyMap> {
        self.layer(LayerId::Base)
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &KeyMap)> {
        self.layers.iter().map(|(layer, keys)| (*layer, keys))
    }

    pub fn key_count(&self) -> usize {
        self.layers.values().map(|keys| keys.len()).sum()
    }

    /// True when no layer holds a single key.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    /// Key map a grid page of `layer` is rewritten from. Missing layers
    /// resolve to an empty map so every cell falls through to the
    /// placeholder/pass-through rules.
    pub fn for_document(&self, layer: LayerId, mode: MappingMode) -> &KeyMap {
        let source = match mode {
            MappingMode::SingleLayer => LayerId::Base,
            MappingMode::MultiLayer => layer,
        };
        self.layer(source).unwrap_or(&EMPTY_KEYMAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(token: &str) -> KeyId {
        KeyId::from_token(token).unwrap()
    }

    #[test]
    fn test_empty_text_is_kept_distinct_from_absent() {
        let mut mapping = LayoutMapping::new();
        mapping.insert(LayerId::Base, key("K_B"), "");

        let base = mapping.base().unwrap();
        assert_eq!(base.get(&key("b")), Some(&String::new()));
        assert_eq!(base.get(&key("c")), None);
        assert!(!mapping.is_empty());
    }

    #[test]
    fn test_single_layer_collapses_to_base() {
        let mut mapping = LayoutMapping::new();
        mapping.insert(LayerId::Base, key("K_A"), "a");
        mapping.insert(LayerId::Shift, key("K_A"), "A");

        let single = mapping.for_document(LayerId::Shift, MappingMode::SingleLayer);
        assert_eq!(single.get(&key("a")).map(String::as_str), Some("a"));

        let multi = mapping.for_document(LayerId::Shift, MappingMode::MultiLayer);
        assert_eq!(multi.get(&key("a")).map(String::as_str), Some("A"));

        assert!(mapping
            .for_document(LayerId::CtrlAlt, MappingMode::MultiLayer)
            .is_empty());
    }
}
