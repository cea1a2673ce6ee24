use crate::{ExportError, ExportSettings, PageSize, TypesetEngine};
use std::str::FromStr;

/// What an export produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// a binary pdf
    #[default]
    Pdf,
    /// a self-contained html document
    Html,
}

impl ExportFormat {
    /// File extension for artifacts of this format
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            other => Err(ExportError::InvalidOptions(format!(
                "unknown export format `{}`; expected pdf or html",
                other
            ))),
        }
    }
}

/// How a pdf is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PdfStrategy {
    /// print the assembled html document from a headless browser
    #[default]
    Browser,
    /// run the annotated markdown through an external typesetter
    Typeset,
}

impl PdfStrategy {
    /// Name used in configuration and logs
    pub const fn as_str(self) -> &'static str {
        match self {
            PdfStrategy::Browser => "browser",
            PdfStrategy::Typeset => "typeset",
        }
    }
}

impl FromStr for PdfStrategy {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(PdfStrategy::Browser),
            "typeset" | "typesetter" => Ok(PdfStrategy::Typeset),
            other => Err(ExportError::InvalidOptions(format!(
                "unknown pdf strategy `{}`; expected browser or typeset",
                other
            ))),
        }
    }
}

/// The complete set of options one export runs with
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    #[allow(missing_docs)]
    pub format: ExportFormat,
    #[allow(missing_docs)]
    pub page_size: PageSize,
    #[allow(missing_docs)]
    pub include_toc: bool,
    #[allow(missing_docs)]
    pub include_cover: bool,
    #[allow(missing_docs)]
    pub include_page_numbers: bool,
    /// running headers and footers
    pub include_headers: bool,
    /// ignored for html exports
    pub strategy: PdfStrategy,
    /// only used by the typesetting strategy
    pub engine: TypesetEngine,
}

impl ExportOptions {
    /// The options implied by a manuscript's stored settings
    pub fn from_settings(settings: &ExportSettings) -> Self {
        ExportOptions {
            format: ExportFormat::default(),
            page_size: settings.page_size,
            include_toc: settings.include_toc,
            include_cover: settings.include_cover,
            include_page_numbers: true,
            include_headers: false,
            strategy: PdfStrategy::default(),
            engine: settings.engine,
        }
    }

    /// Apply per-export overrides field by field;
    /// anything the overrides leave unset keeps its current value
    pub fn with_overrides(mut self, overrides: &ExportOverrides) -> Self {
        macro_rules! override_field {
            ($($field:ident),*) => {
                $(
                    if let Some(value) = overrides.$field {
                        self.$field = value;
                    }
                )*
            };
        }

        override_field!(
            format,
            page_size,
            include_toc,
            include_cover,
            include_page_numbers,
            include_headers,
            strategy,
            engine
        );
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions::from_settings(&ExportSettings::default())
    }
}

/// Per-export changes to a manuscript's stored settings
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct ExportOverrides {
    pub format: Option<ExportFormat>,
    pub page_size: Option<PageSize>,
    pub include_toc: Option<bool>,
    pub include_cover: Option<bool>,
    pub include_page_numbers: Option<bool>,
    pub include_headers: Option<bool>,
    pub strategy: Option<PdfStrategy>,
    pub engine: Option<TypesetEngine>,
}
