//! Export markdown manuscripts to pdf or html.
//!
//! A manuscript is markdown text plus presentation settings: a theme, a column layout,
//! cover details and stored export settings. An export reads one manuscript from a
//! `ManuscriptStore`, merges any per-export overrides into its stored settings, and produces
//! a `RenderedArtifact`:
//!
//! - `html` exports are assembled directly, with an optional cover and table of contents;
//! - `pdf` exports go through one of two renderers, chosen by the `strategy` option:
//!   a headless browser printing the assembled html (`browser`, the default),
//!   or `pandoc` typesetting annotated markdown through LaTeX (`typeset`).
//!
//! # Installation
//!
//! The browser strategy needs a Chromium-family browser (`chromium`, `chromium-browser`,
//! `google-chrome` or `google-chrome-stable` on `PATH`, or configured explicitly).
//! The typesetting strategy needs `pandoc` and a LaTeX installation with the `lettrine`,
//! `fancyhdr` and `geometry` packages. Html exports need nothing.
//!
//! There is a binary, `manuscript-export`, which takes a json description of a manuscript --
//! see `deserialization` -- from stdin and writes the artifact to stdout:
//! `cat in.json | manuscript-export export --format pdf > out.pdf`
//!
//! # Basic Example
//!
//! ```
//! use manuscript_export::{ExportFormat, ExportOverrides, Exporter, Manuscript, ManuscriptBody, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut manuscript = Manuscript::new("draft-1");
//! manuscript.title = "A Book".into();
//! manuscript.body = ManuscriptBody::Continuous("# Greetings\n\nHello world...".into());
//! store.save(manuscript);
//!
//! let exporter = Exporter::with_default_renderers(store);
//! let overrides = ExportOverrides {
//!     format: Some(ExportFormat::Html),
//!     ..ExportOverrides::default()
//! };
//! let artifact = exporter.export("draft-1", &overrides).expect("Error exporting html");
//! assert_eq!(artifact.filename, "a-book.html");
//! ```
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

pub mod config;
pub mod deserialization;
pub mod telemetry;

pub use manuscript_ast::{
    outline, ArtifactBody, Chapters, ColumnLayout, CoverConfig, ExportError, ExportFormat,
    ExportOptions, ExportOverrides, ExportSettings, Manuscript, ManuscriptBody, ManuscriptStore,
    MemoryStore, OutlineEntry, PageSize, PdfRenderer, PdfStrategy, RenderedArtifact, Theme,
    TypesetEngine,
};
pub use manuscript_html::BrowserRenderer;
pub use manuscript_latex::TypesetRenderer;

use manuscript_common::artifact_filename;
use manuscript_html::{assemble_document, resolve_style, InclusionFlags};

/// What an editor shows alongside a manuscript: the assembled document
/// and an outline of its headings
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// the html document, with cover and contents as the stored settings ask
    pub html: String,
    #[allow(missing_docs)]
    pub outline: Vec<OutlineEntry>,
}

/// Build the preview of `manuscript` from its stored settings
pub fn preview(manuscript: &Manuscript) -> Preview {
    let style = resolve_style(manuscript.theme, manuscript.layout);
    let flags = InclusionFlags::from(&manuscript.export_settings);
    Preview {
        html: assemble_document(manuscript, &style, flags),
        outline: outline(&manuscript.body_text()),
    }
}

/// Runs exports of the manuscripts in a store.
///
/// Exports share nothing mutable, so one exporter can serve any number of concurrent calls.
pub struct Exporter<S> {
    store: S,
    browser: Box<dyn PdfRenderer>,
    typesetter: Box<dyn PdfRenderer>,
}

impl<S> fmt::Debug for Exporter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("browser", &self.browser.name())
            .field("typesetter", &self.typesetter.name())
            .finish_non_exhaustive()
    }
}

impl<S: ManuscriptStore> Exporter<S> {
    /// An exporter using the given renderers for each pdf strategy
    pub fn new(store: S, browser: Box<dyn PdfRenderer>, typesetter: Box<dyn PdfRenderer>) -> Self {
        Exporter {
            store,
            browser,
            typesetter,
        }
    }

    /// An exporter with renderers built from `config`
    pub fn from_config(store: S, config: &crate::config::ExportConfig) -> Self {
        Exporter::new(
            store,
            Box::new(config.browser_renderer()),
            Box::new(config.typeset_renderer()),
        )
    }

    /// An exporter with renderers built from the default configuration
    pub fn with_default_renderers(store: S) -> Self {
        Exporter::from_config(store, &crate::config::ExportConfig::default())
    }

    /// The store manuscripts are read from
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The renderer used for pdfs with `strategy`
    pub fn renderer_for(&self, strategy: PdfStrategy) -> &dyn PdfRenderer {
        match strategy {
            PdfStrategy::Browser => self.browser.as_ref(),
            PdfStrategy::Typeset => self.typesetter.as_ref(),
        }
    }

    /// Export the manuscript stored under `id`.
    ///
    /// The manuscript is read once, before anything else happens;
    /// its stored export settings are then overridden field by field by `overrides`.
    pub fn export(
        &self,
        id: &str,
        overrides: &ExportOverrides,
    ) -> Result<RenderedArtifact, ExportError> {
        let manuscript = self.store.fetch(id).ok_or_else(|| {
            warn!(op = "export", result = "not_found", id, "no such manuscript");
            ExportError::ManuscriptNotFound(id.to_string())
        })?;
        let options =
            ExportOptions::from_settings(&manuscript.export_settings).with_overrides(overrides);
        self.export_manuscript(&manuscript, &options)
    }

    /// Export `manuscript` with exactly `options`
    pub fn export_manuscript(
        &self,
        manuscript: &Manuscript,
        options: &ExportOptions,
    ) -> Result<RenderedArtifact, ExportError> {
        let started_at = Instant::now();
        let filename = artifact_filename(&manuscript.title, options.format.extension());

        let result = match options.format {
            ExportFormat::Html => {
                let style = resolve_style(manuscript.theme, manuscript.layout);
                let html = assemble_document(manuscript, &style, options.into());
                Ok(RenderedArtifact::html(html, filename))
            }
            ExportFormat::Pdf => self
                .renderer_for(options.strategy)
                .render_pdf(manuscript, options)
                .map(|pdf| RenderedArtifact::pdf(pdf, filename)),
        };

        let strategy = match options.format {
            ExportFormat::Html => "none",
            ExportFormat::Pdf => self.renderer_for(options.strategy).name(),
        };
        match &result {
            Ok(artifact) => info!(
                op = "export",
                result = "ok",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                id = %manuscript.id,
                format = options.format.extension(),
                strategy,
                bytes = artifact.as_bytes().len(),
                filename = %artifact.filename,
                "exported manuscript"
            ),
            Err(e) => warn!(
                op = "export",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                id = %manuscript.id,
                format = options.format.extension(),
                strategy,
                error = %e,
                "export failed"
            ),
        }
        result
    }
}
