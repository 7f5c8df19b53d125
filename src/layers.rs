use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

pub const GRIDS_DIR: &str = "Grids";
pub const GRID_FILE: &str = "grid.xml";

/// One of the eight modifier combinations a template carries a page for.
#[derive(
    Debug, Clone, Copy, EnumIter, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum LayerId {
    #[serde(rename = "")]
    Base,
    #[serde(rename = "S")]
    Shift,
    #[serde(rename = "C")]
    Ctrl,
    #[serde(rename = "SC")]
    ShiftCtrl,
    #[serde(rename = "RA")]
    Alt,
    #[serde(rename = "SRA")]
    ShiftAlt,
    #[serde(rename = "CRA")]
    CtrlAlt,
    #[serde(rename = "SCA")]
    ShiftCtrlAlt,
}

impl LayerId {
    /// Shift-state token used by layout definitions. Base is the empty string.
    pub fn shift_token(&self) -> &'static str {
        match self {
            Self::Base => "",
            Self::Shift => "S",
            Self::Ctrl => "C",
            Self::ShiftCtrl => "SC",
            Self::Alt => "RA",
            Self::ShiftAlt => "SRA",
            Self::CtrlAlt => "CRA",
            Self::ShiftCtrlAlt => "SCA",
        }
    }

    /// Template folder holding this layer's grid document.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Base => "default",
            Self::Shift => "shift",
            Self::Ctrl => "ctrl",
            Self::ShiftCtrl => "shift_ctrl",
            Self::Alt => "alt",
            Self::ShiftAlt => "shift_alt",
            Self::CtrlAlt => "ctrl_alt",
            Self::ShiftCtrlAlt => "shift_ctrl_alt",
        }
    }

    /// Resolves a shift-state token. Unknown tokens yield `None`.
    pub fn from_shift(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_uppercase();
        match token.as_str() {
            "DEFAULT" | "BASE" => return Some(Self::Base),
            _ => {}
        }
        Self::iter().find(|layer| layer.shift_token() == token)
    }

    pub fn from_folder(folder: &str) -> Option<Self> {
        Self::iter().find(|layer| layer.folder() == folder)
    }

    /// `<root>/Grids/<folder>/grid.xml`
    pub fn grid_path(&self, root: &Path) -> PathBuf {
        root.join(GRIDS_DIR).join(self.folder()).join(GRID_FILE)
    }
}

/// The fixed folder → layer table, in template order.
pub fn folder_table() -> Vec<(&'static str, LayerId)> {
    LayerId::iter().map(|layer| (layer.folder(), layer)).collect()
}
