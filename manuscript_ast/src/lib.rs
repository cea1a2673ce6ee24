//! This crate describes a manuscript as it is stored -- title, author, markdown text and
//! presentation settings -- together with the options an export is run with.
//! Rendering backends take a `Manuscript` and `ExportOptions` and turn them into
//! a particular output format.
//!
//! ```
//! use manuscript_ast::{Manuscript, ManuscriptBody, ExportOptions};
//!
//! let mut manuscript = Manuscript::new("draft-1");
//! manuscript.title = "A Book".into();
//! manuscript.author = "A.N. Author".into();
//! manuscript.body = ManuscriptBody::Continuous("# Greetings\n\nHello world...".into());
//! let options = ExportOptions::from_settings(&manuscript.export_settings);
//! assert!(options.include_toc);
//! ```
//!
//! # Headings
//! The heading structure of a text is recovered line by line: see `headings`, which
//! drives both on-screen tables of contents and page breaking in typeset output.

#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
pub use manuscript_common::ExportError;
mod headings;
mod options;
mod render;
mod store;
pub use headings::{headings, outline, parse_heading, HeadingNode, Headings, OutlineEntry};
pub use options::{ExportFormat, ExportOptions, ExportOverrides, PdfStrategy};
pub use render::{ArtifactBody, PdfRenderer, RenderedArtifact};
pub use store::{ManuscriptStore, MemoryStore};

/// The named visual themes a manuscript can be presented in.
/// Any identifier which is not recognised resolves to the default, `Classic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    /// serif book typography
    #[default]
    Classic,
    /// sans headings and a lighter text block
    Modern,
    /// plain, compact and unadorned
    Minimal,
}

impl Theme {
    /// Every theme, in display order
    pub const ALL: [Theme; 3] = [Theme::Classic, Theme::Modern, Theme::Minimal];

    /// Resolve a stored theme identifier; this never fails, degrading to the default theme
    pub fn resolve(identifier: &str) -> Self {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "classic" => Theme::Classic,
            "modern" => Theme::Modern,
            "minimal" => Theme::Minimal,
            _ => Theme::default(),
        }
    }

    /// The identifier this theme is stored under
    pub const fn identifier(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Modern => "modern",
            Theme::Minimal => "minimal",
        }
    }
}

/// How body text flows on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnLayout {
    /// one column
    #[default]
    Single,
    /// two columns separated by a gap
    Double,
}

impl ColumnLayout {
    /// `double` gives two columns; anything else is a single column
    pub fn resolve(identifier: &str) -> Self {
        if identifier.trim().eq_ignore_ascii_case("double") {
            ColumnLayout::Double
        } else {
            ColumnLayout::Single
        }
    }

    /// The identifier this layout is stored under
    pub const fn identifier(self) -> &'static str {
        match self {
            ColumnLayout::Single => "single",
            ColumnLayout::Double => "double",
        }
    }
}

/// Paper sizes an export can be produced at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    /// 210 × 297mm
    #[default]
    A4,
    /// North American letter size
    Letter,
    /// 148 × 210mm
    A5,
}

impl PageSize {
    /// The name used in css `@page { size: ... }` rules
    pub const fn css_name(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "letter",
            PageSize::A5 => "A5",
        }
    }

    /// The name LaTeX geometry expects
    pub const fn latex_name(self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::Letter => "letter",
            PageSize::A5 => "a5",
        }
    }
}

impl FromStr for PageSize {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "a5" => Ok(PageSize::A5),
            other => Err(ExportError::InvalidOptions(format!(
                "unknown page size `{}`; expected a4, letter or a5",
                other
            ))),
        }
    }
}

/// The LaTeX engines the typesetter can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypesetEngine {
    /// classic 8-bit engine; fastest, but limited to TeX fonts
    Pdflatex,
    /// unicode engine using system fonts
    #[default]
    Xelatex,
    /// unicode engine using system fonts, scriptable in lua
    Lualatex,
}

impl TypesetEngine {
    /// The engine's command name
    pub const fn as_str(self) -> &'static str {
        match self {
            TypesetEngine::Pdflatex => "pdflatex",
            TypesetEngine::Xelatex => "xelatex",
            TypesetEngine::Lualatex => "lualatex",
        }
    }

    /// Whether fonts can be selected by family name
    pub const fn supports_system_fonts(self) -> bool {
        !matches!(self, TypesetEngine::Pdflatex)
    }
}

impl FromStr for TypesetEngine {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdflatex" => Ok(TypesetEngine::Pdflatex),
            "xelatex" => Ok(TypesetEngine::Xelatex),
            "lualatex" => Ok(TypesetEngine::Lualatex),
            other => Err(ExportError::InvalidOptions(format!(
                "unknown typesetting engine `{}`; expected pdflatex, xelatex or lualatex",
                other
            ))),
        }
    }
}

impl fmt::Display for TypesetEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units margins can be given in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementUnit {
    /// inches
    Inches,
    /// millimetres
    Mm,
}

impl MeasurementUnit {
    const fn suffix(self) -> &'static str {
        match self {
            MeasurementUnit::Inches => "in",
            MeasurementUnit::Mm => "mm",
        }
    }
}

/// Page margins
#[derive(Debug, Clone, PartialEq)]
pub struct Margins {
    #[allow(missing_docs)]
    pub top: f32,
    #[allow(missing_docs)]
    pub bottom: f32,
    #[allow(missing_docs)]
    pub left: f32,
    #[allow(missing_docs)]
    pub right: f32,
    #[allow(missing_docs)]
    pub unit: MeasurementUnit,
}

impl Margins {
    /// The same margin on every side
    pub fn uniform(margin: f32, unit: MeasurementUnit) -> Self {
        Margins {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
            unit,
        }
    }

    fn length(&self, value: f32) -> String {
        format!("{}{}", value, self.unit.suffix())
    }

    /// css shorthand, in top right bottom left order
    pub fn to_css(&self) -> String {
        format!(
            "{} {} {} {}",
            self.length(self.top),
            self.length(self.right),
            self.length(self.bottom),
            self.length(self.left)
        )
    }

    /// options for the LaTeX geometry package
    pub fn to_geometry(&self) -> String {
        format!(
            "top={}, bottom={}, left={}, right={}",
            self.length(self.top),
            self.length(self.bottom),
            self.length(self.left),
            self.length(self.right)
        )
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(20.0, MeasurementUnit::Mm)
    }
}

/// Export settings stored alongside a manuscript;
/// these seed the options of each export, which may override them field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// engine used when typesetting
    pub engine: TypesetEngine,
    /// include a table of contents
    pub include_toc: bool,
    /// include a cover page
    pub include_cover: bool,
    #[allow(missing_docs)]
    pub page_size: PageSize,
    #[allow(missing_docs)]
    pub margins: Margins,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            engine: TypesetEngine::default(),
            include_toc: true,
            include_cover: true,
            page_size: PageSize::default(),
            margins: Margins::default(),
        }
    }
}

/// Overrides for what appears on the cover; unset fields fall back to the manuscript itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverConfig {
    /// cover title, in place of the manuscript title
    pub title: Option<String>,
    /// a subtitle, shown only on the cover and in document metadata
    pub subtitle: Option<String>,
    /// cover author, in place of the manuscript author
    pub author: Option<String>,
    /// reference to an uploaded background image
    pub background_image: Option<String>,
}

/// One chapter of a chapter-structured manuscript
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    #[allow(missing_docs)]
    pub title: String,
    /// markdown text
    pub body: String,
    order_index: usize,
    page_number: usize,
}

impl Chapter {
    /// Position of this chapter, counting from zero
    pub fn order_index(&self) -> usize {
        self.order_index
    }

    /// Page number derived from the chapter's position
    pub fn page_number(&self) -> usize {
        self.page_number
    }
}

/// The ordered chapters of a manuscript.
/// After every change, order indices run `0..len` without gaps
/// and each page number is its index plus one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapters(Vec<Chapter>);

impl Chapters {
    /// Append a chapter at the end
    pub fn push<T: Into<String>, B: Into<String>>(&mut self, title: T, body: B) -> &mut Self {
        self.0.push(Chapter {
            title: title.into(),
            body: body.into(),
            order_index: 0,
            page_number: 0,
        });
        self.renumber();
        self
    }

    /// Remove the chapter at `index`, if there is one
    pub fn remove(&mut self, index: usize) -> Option<Chapter> {
        if index >= self.0.len() {
            return None;
        }
        let removed = self.0.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Move the chapter at `from` so that it ends up at `to`.
    /// Out of range positions are clamped to the last chapter.
    pub fn move_chapter(&mut self, from: usize, to: usize) {
        if self.0.is_empty() || from >= self.0.len() {
            return;
        }
        let to = to.min(self.0.len() - 1);
        let chapter = self.0.remove(from);
        self.0.insert(to, chapter);
        self.renumber();
    }

    /// The chapters in order
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.0.iter()
    }

    /// Mutable access to a chapter's text; its position can only change through `move_chapter`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Chapter> {
        self.0.get_mut(index)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn renumber(&mut self) {
        for (index, chapter) in self.0.iter_mut().enumerate() {
            chapter.order_index = index;
            chapter.page_number = index + 1;
        }
    }

    fn concatenate(&self) -> String {
        self.0
            .iter()
            .map(|chapter| {
                if chapter.title.trim().is_empty() {
                    chapter.body.clone()
                } else {
                    format!("# {}\n\n{}", chapter.title.trim(), chapter.body)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A manuscript's text: either one continuous document
/// or a sequence of titled chapters
#[derive(Debug, Clone, PartialEq)]
pub enum ManuscriptBody {
    /// a single markdown document
    Continuous(String),
    /// chapters, each becoming a top-level heading followed by its text
    Chapters(Chapters),
}

impl Default for ManuscriptBody {
    fn default() -> Self {
        ManuscriptBody::Continuous(String::new())
    }
}

impl ManuscriptBody {
    /// The whole text as one markdown stream; an empty manuscript gives an empty string
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            ManuscriptBody::Continuous(s) => Cow::Borrowed(s),
            ManuscriptBody::Chapters(chapters) => Cow::Owned(chapters.concatenate()),
        }
    }
}

/// The stored, writable document an export is made from
#[derive(Debug, Clone, PartialEq)]
pub struct Manuscript {
    #[allow(missing_docs)]
    pub id: String,
    #[allow(missing_docs)]
    pub title: String,
    /// may be empty
    pub author: String,
    #[allow(missing_docs)]
    pub body: ManuscriptBody,
    #[allow(missing_docs)]
    pub theme: Theme,
    #[allow(missing_docs)]
    pub layout: ColumnLayout,
    #[allow(missing_docs)]
    pub cover: CoverConfig,
    #[allow(missing_docs)]
    pub export_settings: ExportSettings,
}

impl Manuscript {
    /// A manuscript with default settings and no text
    pub fn new<S: Into<String>>(id: S) -> Self {
        Manuscript {
            id: id.into(),
            title: "Untitled Manuscript".to_string(),
            author: String::new(),
            body: ManuscriptBody::default(),
            theme: Theme::default(),
            layout: ColumnLayout::default(),
            cover: CoverConfig::default(),
            export_settings: ExportSettings::default(),
        }
    }

    /// The body as a single markdown text
    pub fn body_text(&self) -> Cow<'_, str> {
        self.body.text()
    }

    /// Title to show on the cover
    pub fn cover_title(&self) -> &str {
        non_empty(self.cover.title.as_deref()).unwrap_or(&self.title)
    }

    /// Author to show on the cover, if any
    pub fn cover_author(&self) -> Option<&str> {
        non_empty(self.cover.author.as_deref()).or_else(|| non_empty(Some(self.author.as_str())))
    }

    /// Subtitle, if one is set
    pub fn subtitle(&self) -> Option<&str> {
        non_empty(self.cover.subtitle.as_deref())
    }

    /// The chapters of this manuscript, converting it to a chapter structure if it is not one already.
    /// Any existing continuous text becomes an untitled first chapter.
    pub fn chapters_mut(&mut self) -> &mut Chapters {
        if let ManuscriptBody::Continuous(text) = &mut self.body {
            let mut chapters = Chapters::default();
            if !text.is_empty() {
                chapters.push("", std::mem::take(text));
            }
            self.body = ManuscriptBody::Chapters(chapters);
        }
        match &mut self.body {
            ManuscriptBody::Chapters(chapters) => chapters,
            ManuscriptBody::Continuous(_) => unreachable!("converted above"),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
