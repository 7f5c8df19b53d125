use crate::config::RewriteParams;
use crate::error::{io_at, GfResult};
use crate::fixup;
use crate::grid::{
    command_ids, Element, GridDocument, CAPTION_PATH, COMMAND, COMMANDS_PATH, PARAMETER,
};
use crate::keys::KeyId;
use crate::layers::{folder_table, LayerId};
use crate::mapping::{KeyMap, LayoutMapping, MappingMode};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const SPACE_ACTION: &str = "Action.Space";

/// Commands whose cells are never relabeled from the layout.
pub const RESERVED_ACTIONS: [&str; 6] = [
    SPACE_ACTION,
    "Action.DeleteLetter",
    "Action.DeleteWord",
    "Action.Clear",
    "Action.Enter",
    "Action.Tab",
];

/// Parameter keys holding the character a command types: `letter` for a
/// single keystroke, `text` for inserted text.
pub const CHARACTER_ROLES: [&str; 2] = ["letter", "text"];

const SPACE_CAPTION: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    Replaced,
    Placeholder,
    Space,
    Reserved,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub cells: usize,
    pub replaced: usize,
    pub placeholders: usize,
    pub spaces: usize,
    pub reserved: usize,
    pub unchanged: usize,
}

impl RewriteStats {
    fn record(&mut self, outcome: CellOutcome) {
        self.cells += 1;
        match outcome {
            CellOutcome::Replaced => self.replaced += 1,
            CellOutcome::Placeholder => self.placeholders += 1,
            CellOutcome::Space => self.spaces += 1,
            CellOutcome::Reserved => self.reserved += 1,
            CellOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: &RewriteStats) {
        self.cells += other.cells;
        self.replaced += other.replaced;
        self.placeholders += other.placeholders;
        self.spaces += other.spaces;
        self.reserved += other.reserved;
        self.unchanged += other.unchanged;
    }

    /// Cells whose caption or parameters were written.
    pub fn modified(&self) -> usize {
        self.replaced + self.placeholders + self.spaces
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub layer: LayerId,
    pub folder: &'static str,
    /// `None` when the template has no page for this layer.
    pub stats: Option<RewriteStats>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
    pub layers: Vec<LayerReport>,
}

impl RewriteReport {
    pub fn total(&self) -> RewriteStats {
        let mut total = RewriteStats::default();
        for stats in self.layers.iter().filter_map(|l| l.stats.as_ref()) {
            total.merge(stats);
        }
        total
    }

    pub fn documents(&self) -> usize {
        self.layers.iter().filter(|l| l.stats.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct GridRewriter {
    placeholder: String,
    mode: MappingMode,
}

impl Default for GridRewriter {
    fn default() -> Self {
        Self::from_params(&RewriteParams::default())
    }
}

impl GridRewriter {
    pub fn new(placeholder: impl Into<String>, mode: MappingMode) -> Self {
        Self {
            placeholder: placeholder.into(),
            mode,
        }
    }

    pub fn from_params(params: &RewriteParams) -> Self {
        Self::new(params.placeholder.clone(), params.mode)
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    /// Rewrites every layer page found under `root` in place. Pages are
    /// serialized, repaired and written back one at a time.
    pub fn rewrite_tree(&self, root: &Path, mapping: &LayoutMapping) -> GfResult<RewriteReport> {
        let mut report = RewriteReport::default();

        for (folder, layer) in folder_table() {
            let path = layer.grid_path(root);
            if !path.is_file() {
                debug!("No grid page for layer '{}'; skipping", folder);
                report.layers.push(LayerReport {
                    layer,
                    folder,
                    stats: None,
                });
                continue;
            }

            let keys = mapping.for_document(layer, self.mode);
            let mut doc = GridDocument::load(&path)?;
            let stats = self.rewrite_document(&mut doc, keys);

            let xml = fixup::apply(&doc.to_xml_string()?);
            fs::write(&path, xml).map_err(io_at(&path))?;

            debug!(
                "Layer '{}': {} of {} cells modified ({} keys available)",
                folder,
                stats.modified(),
                stats.cells,
                keys.len()
            );
            report.layers.push(LayerReport {
                layer,
                folder,
                stats: Some(stats),
            });
        }

        let total = report.total();
        info!(
            "Rewrote {} grid pages: {} replaced, {} placeholders, {} spaces",
            report.documents(),
            total.replaced,
            total.placeholders,
            total.spaces
        );
        Ok(report)
    }

    pub fn rewrite_document(&self, doc: &mut GridDocument, keys: &KeyMap) -> RewriteStats {
        let mut stats = RewriteStats::default();
        doc.for_each_cell_mut(|cell| stats.record(self.rewrite_cell(cell, keys)));
        stats
    }

    pub fn rewrite_cell(&self, cell: &mut Element, keys: &KeyMap) -> CellOutcome {
        let (reserved, space_action) = {
            let ids = command_ids(cell);
            let reserved = ids
                .iter()
                .any(|id| RESERVED_ACTIONS.iter().any(|r| id.eq_ignore_ascii_case(r)));
            let space_action = ids.iter().any(|id| id.eq_ignore_ascii_case(SPACE_ACTION));
            (reserved, space_action)
        };

        // captions are never created; only an existing empty one gets the placeholder
        let Some(caption) = cell.find_path_mut(&CAPTION_PATH) else {
            return if reserved {
                CellOutcome::Reserved
            } else {
                CellOutcome::Unchanged
            };
        };

        if reserved {
            if space_action {
                caption.set_text(SPACE_CAPTION);
                return CellOutcome::Space;
            }
            return CellOutcome::Reserved;
        }

        let Some(key) = KeyId::from_token(&caption.text()) else {
            // blank decorative cells get the placeholder, whitespace stays
            if caption.has_no_text() {
                caption.set_text(&self.placeholder);
                return CellOutcome::Placeholder;
            }
            return CellOutcome::Unchanged;
        };

        if key.is_space() {
            caption.set_text(SPACE_CAPTION);
            return CellOutcome::Space;
        }

        let Some(text) = keys.get(&key) else {
            return CellOutcome::Unchanged;
        };

        let (value, outcome) = if text.is_empty() {
            (self.placeholder.as_str(), CellOutcome::Placeholder)
        } else {
            (text.as_str(), CellOutcome::Replaced)
        };

        caption.set_text(value);
        set_character_parameters(cell, value);
        outcome
    }
}

fn set_character_parameters(cell: &mut Element, value: &str) {
    let Some(commands) = cell.find_path_mut(&COMMANDS_PATH) else {
        return;
    };

    for command in commands.children_named_mut(COMMAND) {
        for param in command.children_named_mut(PARAMETER) {
            let is_character = param
                .attr("Key")
                .is_some_and(|role| CHARACTER_ROLES.iter().any(|r| role.eq_ignore_ascii_case(r)));
            if is_character {
                param.set_text(value);
            }
        }
    }
}
