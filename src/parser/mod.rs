pub mod embedded;
pub mod structured;

use crate::error::GfResult;
use crate::mapping::LayoutMapping;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::info;

/// The two source shapes a layout definition arrives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LayoutFormat {
    /// Markup with explicit `<layer>` / `<key>` elements.
    Structured,
    /// Compiled keyboard script carrying the key strings as a literal.
    #[value(alias = "embedded")]
    EmbeddedLiteral,
}

impl LayoutFormat {
    /// Markup starts with `<` once a BOM and leading whitespace are skipped.
    pub fn detect(raw: &[u8]) -> Self {
        let first = strip_bom(raw)
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .copied();

        match first {
            Some(b'<') => Self::Structured,
            _ => Self::EmbeddedLiteral,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutDefinition {
    pub name: Option<String>,
    pub format: LayoutFormat,
    pub mapping: LayoutMapping,
}

/// Parses raw layout bytes, detecting the format unless one is forced.
///
/// Structured input that is not well-formed fails with `ParseMalformed`.
/// The script-literal scan never fails: unrecognizable input yields an
/// empty mapping and the rewrite proceeds with it.
pub fn parse_layout(raw: &[u8], format: Option<LayoutFormat>) -> GfResult<LayoutDefinition> {
    let format = format.unwrap_or_else(|| LayoutFormat::detect(raw));

    let (name, mapping) = match format {
        LayoutFormat::Structured => structured::parse(raw)?,
        LayoutFormat::EmbeddedLiteral => embedded::parse(raw),
    };

    info!(
        "Parsed {} layout{}: {} layers, {} keys",
        format,
        name.as_deref()
            .map(|n| format!(" '{}'", n))
            .unwrap_or_default(),
        mapping.layers().count(),
        mapping.key_count()
    );

    Ok(LayoutDefinition {
        name,
        format,
        mapping,
    })
}

pub(crate) fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(raw)
}
