//! Read manuscripts and export options from json.
//!
//! Field names are camelCase, as a routing layer would send them:
//! ```json
//! {
//!   "title": "A Book",
//!   "author": "A.N. Author",
//!   "body": "# Greetings\n\nHello world...",
//!   "theme": "modern",
//!   "layout": "double",
//!   "cover": {"subtitle": "Being a Test", "backgroundImage": "/uploads/cover.png"},
//!   "exportSettings": {"engine": "xelatex", "includeTOC": true, "pageSize": "a5"}
//! }
//! ```
//! Texts may be given inline, or read from a markdown file as `{"path": "chapter-1.md"}`.
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use manuscript_ast::{
	ColumnLayout, ExportError, ExportOverrides, Manuscript, ManuscriptBody, Margins,
	MeasurementUnit, Theme
};

/// Errors possible while reading json input
#[derive(Debug, Error)]
pub enum DeserializationError {
	/// The input is not json of the expected shape
	#[error("invalid json: {0}")]
	Json(#[from] serde_json::Error),
	/// A text given as a path could not be read
	#[error("could not read {}: {source}", .path.display())]
	Io {
		/// the file named
		path: PathBuf,
		/// the underlying error
		#[source]
		source: io::Error
	},
	/// A value is not one of the recognised options
	#[error(transparent)]
	Options(#[from] ExportError)
}

/// Parse a manuscript from json
pub fn manuscript_from_json(src: &str) -> Result<Manuscript, DeserializationError> {
	let deserialized: DeserializableManuscript = serde_json::from_str(src)?;
	deserialized.into_manuscript()
}

/// Parse per-export option overrides from json
pub fn overrides_from_json(src: &str) -> Result<ExportOverrides, DeserializationError> {
	let deserialized: DeserializableOverrides = serde_json::from_str(src)?;
	deserialized.into_overrides()
}

/// Markdown given inline as a string, or read from a file named as `{"path": "..."}`.
///
/// A plain string is always the text itself, even if it happens to name a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum TextSource {
	Text(String),
	File {
		path: PathBuf
	}
}

impl TextSource {
	/// The text, reading it from disk if necessary
	pub fn into_text(self) -> Result<String, DeserializationError> {
		match self {
			TextSource::Text(s) => Ok(s),
			TextSource::File { path } => fs::read_to_string(&path)
				.map_err(|source| DeserializationError::Io { path, source })
		}
	}
}

/// A chapter, for manuscripts divided into chapters
#[derive(Debug, Deserialize)]
pub struct DeserializableChapter {
	/// an empty title gives a chapter with no heading of its own
	#[serde(default)]
	pub title: String,
	#[allow(missing_docs)]
	pub body: TextSource
}

/// Cover overrides
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct DeserializableCover {
	pub title: Option<String>,
	pub subtitle: Option<String>,
	pub author: Option<String>,
	pub background_image: Option<String>
}

/// Page margins
#[derive(Debug, Deserialize)]
pub struct DeserializableMargins {
	#[allow(missing_docs)]
	pub top: f32,
	#[allow(missing_docs)]
	pub bottom: f32,
	#[allow(missing_docs)]
	pub left: f32,
	#[allow(missing_docs)]
	pub right: f32,
	/// `mm` (the default) or `in`
	#[serde(default)]
	pub unit: Option<String>
}

impl DeserializableMargins {
	fn into_margins(self) -> Result<Margins, DeserializationError> {
		let unit = match self.unit.as_deref().map(|u| u.trim().to_ascii_lowercase()) {
			None => MeasurementUnit::Mm,
			Some(u) if u == "mm" => MeasurementUnit::Mm,
			Some(u) if u == "in" || u == "inches" => MeasurementUnit::Inches,
			Some(other) => {
				let e = ExportError::InvalidOptions(format!("unknown margin unit `{}`; expected mm or in", other));
				return Err(e.into());
			}
		};
		Ok(Margins {
			top: self.top,
			bottom: self.bottom,
			left: self.left,
			right: self.right,
			unit
		})
	}
}

/// Stored export settings; anything missing keeps its default
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct DeserializableExportSettings {
	pub engine: Option<String>,
	#[serde(rename = "includeTOC", alias = "includeToc")]
	pub include_toc: Option<bool>,
	pub include_cover: Option<bool>,
	pub page_size: Option<String>,
	pub margins: Option<DeserializableMargins>
}

/// A simplified representation of a manuscript for easy deserializing.
///
/// Nothing is required; missing fields take the defaults of a new manuscript.
/// If both `body` and `chapters` are given, the body becomes an untitled first chapter.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeserializableManuscript {
	/// defaults to `manuscript`
	pub id: Option<String>,
	#[allow(missing_docs)]
	pub title: Option<String>,
	#[allow(missing_docs)]
	pub author: Option<String>,
	/// continuous text, inline or from a file
	pub body: Option<TextSource>,
	#[allow(missing_docs)]
	pub chapters: Vec<DeserializableChapter>,
	/// unrecognised themes fall back to the default
	pub theme: Option<String>,
	/// `single` or `double`
	pub layout: Option<String>,
	#[allow(missing_docs)]
	pub cover: DeserializableCover,
	#[allow(missing_docs)]
	pub export_settings: DeserializableExportSettings
}

impl DeserializableManuscript {
	/// Convert to a `Manuscript`, reading any texts given as paths
	pub fn into_manuscript(self) -> Result<Manuscript, DeserializationError> {
		let src = self;
		let mut manuscript = Manuscript::new(src.id.unwrap_or_else(|| "manuscript".to_string()));

		macro_rules! ifsomethen {
			($srcfield:ident, $target:expr) => {
				if let Some(x) = src.$srcfield {
					$target = x;
				}
			};
		}

		ifsomethen!(title, manuscript.title);
		ifsomethen!(author, manuscript.author);
		if let Some(body) = src.body {
			manuscript.body = ManuscriptBody::Continuous(body.into_text()?);
		}
		for chapter in src.chapters.into_iter() {
			let body = chapter.body.into_text()?;
			manuscript.chapters_mut().push(chapter.title, body);
		}
		if let Some(theme) = src.theme {
			manuscript.theme = Theme::resolve(&theme);
		}
		if let Some(layout) = src.layout {
			manuscript.layout = ColumnLayout::resolve(&layout);
		}

		manuscript.cover.title = src.cover.title;
		manuscript.cover.subtitle = src.cover.subtitle;
		manuscript.cover.author = src.cover.author;
		manuscript.cover.background_image = src.cover.background_image;

		let settings = src.export_settings;
		let stored = &mut manuscript.export_settings;
		if let Some(engine) = settings.engine {
			stored.engine = engine.parse()?;
		}
		if let Some(page_size) = settings.page_size {
			stored.page_size = page_size.parse()?;
		}
		if let Some(include_toc) = settings.include_toc {
			stored.include_toc = include_toc;
		}
		if let Some(include_cover) = settings.include_cover {
			stored.include_cover = include_cover;
		}
		if let Some(margins) = settings.margins {
			stored.margins = margins.into_margins()?;
		}
		Ok(manuscript)
	}
}

/// Per-export option overrides; anything missing keeps the manuscript's stored setting
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct DeserializableOverrides {
	pub format: Option<String>,
	pub page_size: Option<String>,
	#[serde(rename = "includeTOC", alias = "includeToc")]
	pub include_toc: Option<bool>,
	pub include_cover: Option<bool>,
	pub include_page_numbers: Option<bool>,
	pub include_headers: Option<bool>,
	pub strategy: Option<String>,
	pub engine: Option<String>
}

impl DeserializableOverrides {
	/// Convert to `ExportOverrides`, rejecting unrecognised values
	pub fn into_overrides(self) -> Result<ExportOverrides, DeserializationError> {
		Ok(ExportOverrides {
			format: self.format.as_deref().map(str::parse).transpose()?,
			page_size: self.page_size.as_deref().map(str::parse).transpose()?,
			include_toc: self.include_toc,
			include_cover: self.include_cover,
			include_page_numbers: self.include_page_numbers,
			include_headers: self.include_headers,
			strategy: self.strategy.as_deref().map(str::parse).transpose()?,
			engine: self.engine.as_deref().map(str::parse).transpose()?
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use manuscript_ast::{ExportFormat, PageSize, PdfStrategy, TypesetEngine};

	#[test]
	fn test_empty_object_gives_defaults() {
		let m = manuscript_from_json("{}").unwrap();
		assert_eq!(m, Manuscript::new("manuscript"));
	}

	#[test]
	fn test_full_manuscript() {
		let json = r##"{
			"id": "m42",
			"title": "A Book",
			"author": "A.N. Author",
			"body": "# Greetings\n\nHello world...",
			"theme": "modern",
			"layout": "double",
			"cover": {"subtitle": "Being a Test", "backgroundImage": "/uploads/cover.png"},
			"exportSettings": {
				"engine": "lualatex",
				"includeTOC": false,
				"pageSize": "a5",
				"margins": {"top": 1, "bottom": 1, "left": 0.75, "right": 0.75, "unit": "in"}
			}
		}"##;
		let m = manuscript_from_json(json).unwrap();
		assert_eq!(m.id, "m42");
		assert_eq!(m.body_text(), "# Greetings\n\nHello world...");
		assert_eq!(m.theme, Theme::Modern);
		assert_eq!(m.layout, ColumnLayout::Double);
		assert_eq!(m.subtitle(), Some("Being a Test"));
		assert_eq!(m.cover.background_image.as_deref(), Some("/uploads/cover.png"));
		assert_eq!(m.export_settings.engine, TypesetEngine::Lualatex);
		assert!(!m.export_settings.include_toc);
		assert!(m.export_settings.include_cover);
		assert_eq!(m.export_settings.page_size, PageSize::A5);
		assert_eq!(m.export_settings.margins.to_geometry(), "top=1in, bottom=1in, left=0.75in, right=0.75in");
	}

	#[test]
	fn test_chapters() {
		let json = r#"{
			"title": "Chaptered",
			"chapters": [
				{"title": "One", "body": "First."},
				{"title": "Two", "body": "Second."}
			]
		}"#;
		let m = manuscript_from_json(json).unwrap();
		assert_eq!(m.body_text(), "# One\n\nFirst.\n\n# Two\n\nSecond.");
	}

	#[test]
	fn test_body_from_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("body.md");
		fs::write(&path, "# From disk\n\nText.").unwrap();
		let json = serde_json::json!({ "body": { "path": path.display().to_string() } }).to_string();
		let m = manuscript_from_json(&json).unwrap();
		assert_eq!(m.body_text(), "# From disk\n\nText.");
	}

	#[test]
	fn test_string_naming_a_file_stays_text() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("notes.md");
		fs::write(&path, "private notes").unwrap();
		let named = path.display().to_string();
		let json = serde_json::json!({
			"body": named,
			"chapters": [{"title": "One", "body": named}]
		}).to_string();
		let m = manuscript_from_json(&json).unwrap();
		assert!(!m.body_text().contains("private notes"));
		assert!(m.body_text().contains(&named));
	}

	#[test]
	fn test_missing_text_file_is_an_error() {
		let err = manuscript_from_json(r#"{"body": {"path": "/no/such/dir/body.md"}}"#).unwrap_err();
		assert!(matches!(err, DeserializationError::Io { .. }));
	}

	#[test]
	fn test_unknown_theme_is_not_an_error() {
		let m = manuscript_from_json(r#"{"theme": "vaporwave"}"#).unwrap();
		assert_eq!(m.theme, Theme::Classic);
	}

	#[test]
	fn test_invalid_values_are_rejected() {
		let err = manuscript_from_json(r#"{"exportSettings": {"engine": "troff"}}"#).unwrap_err();
		assert!(matches!(err, DeserializationError::Options(ExportError::InvalidOptions(_))));
		let err = overrides_from_json(r#"{"format": "docx"}"#).unwrap_err();
		assert!(matches!(err, DeserializationError::Options(_)));
		assert!(matches!(manuscript_from_json("[").unwrap_err(), DeserializationError::Json(_)));
	}

	#[test]
	fn test_overrides() {
		let overrides = overrides_from_json(
			r#"{"format": "html", "includeTOC": false, "includeHeaders": true, "strategy": "typeset", "engine": "pdflatex", "pageSize": "letter"}"#
		).unwrap();
		assert_eq!(overrides.format, Some(ExportFormat::Html));
		assert_eq!(overrides.include_toc, Some(false));
		assert_eq!(overrides.include_cover, None);
		assert_eq!(overrides.include_headers, Some(true));
		assert_eq!(overrides.strategy, Some(PdfStrategy::Typeset));
		assert_eq!(overrides.engine, Some(TypesetEngine::Pdflatex));
		assert_eq!(overrides.page_size, Some(PageSize::Letter));
		assert_eq!(overrides_from_json("{}").unwrap(), ExportOverrides::default());
	}
}
