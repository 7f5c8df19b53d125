use crate::config::RewriteParams;
use crate::directory::LayoutSource;
use crate::error::{GfResult, GridForgeError};
use crate::package::{self, package_file_name};
use crate::parser::{parse_layout, LayoutDefinition, LayoutFormat};
use crate::rewriter::{GridRewriter, RewriteReport};
use crate::template::Template;
use serde::Serialize;
use tracing::{info, warn};

/// Result of one build: the finished package and what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutput {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
    pub definition: LayoutDefinition,
    pub report: RewriteReport,
}

/// One template plus the rewrite policy applied to every build against it.
///
/// Builds only read the template, so one instance can serve concurrent
/// requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GridForge {
    template: Template,
    rewriter: GridRewriter,
}

impl GridForge {
    pub fn new(template: Template, params: &RewriteParams) -> Self {
        Self {
            template,
            rewriter: GridRewriter::from_params(params),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn rewriter(&self) -> &GridRewriter {
        &self.rewriter
    }

    /// Parse → rewrite a private template copy → package.
    ///
    /// Nothing is returned unless every page was rewritten and the archive
    /// completed. The working copy is removed either way.
    pub fn build(
        &self,
        layout_id: &str,
        raw: &[u8],
        format: Option<LayoutFormat>,
    ) -> GfResult<PackageOutput> {
        let definition = parse_layout(raw, format)?;
        if definition.mapping.is_empty() {
            warn!(
                "Layout '{}' maps no keys; only placeholders and spaces will change",
                layout_id
            );
        }

        let copy = self.template.checkout()?;
        let report = self.rewriter.rewrite_tree(copy.path(), &definition.mapping)?;
        let package = package::assemble(copy.path())?;

        if let Err(e) = copy.close() {
            warn!("Could not remove working copy: {}", e);
        }

        let file_name = package_file_name(layout_id);
        info!(
            "Built {} ({} entries, {} bytes)",
            file_name,
            package.entries.len(),
            package.bytes.len()
        );

        Ok(PackageOutput {
            file_name,
            bytes: package.bytes,
            entries: package.entries,
            definition,
            report,
        })
    }

    /// Fetches the layout for `layout_id` from `source`, then builds.
    pub fn fetch_and_build<S: LayoutSource + ?Sized>(
        &self,
        source: &S,
        layout_id: &str,
        format: Option<LayoutFormat>,
    ) -> GfResult<PackageOutput> {
        let raw = source.fetch(layout_id)?.ok_or_else(|| {
            GridForgeError::LookupEmpty(format!("no layout definition for '{}'", layout_id))
        })?;
        self.build(layout_id, &raw, format)
    }
}
