//! Rewrite a manuscript's markdown into the annotated text the typesetter consumes.
//!
//! The text is given a metadata block, then passed through line by line:
//! every top-level heading but the first is preceded by a page break,
//! and the first paragraph line after a heading opens with a drop capital.

use crate::header::header_commands;
use manuscript_ast::{headings, parse_heading, ExportOptions, Manuscript, Theme};
use manuscript_common::escape_to_latex;

/// Directive placed before each top-level heading after the first
pub const PAGE_BREAK: &str = "\n\\newpage\n\n";
/// depth of the typeset table of contents
const TOC_DEPTH: u8 = 2;
const DOCUMENT_CLASS: &str = "article";
const FONT_SIZE: &str = "12pt";

/// System font families a theme asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeFonts {
	/// body text
	pub main: Option<&'static str>,
	/// sans serif text
	pub sans: Option<&'static str>
}

/// The fonts to request for `theme`
pub fn theme_fonts(theme: Theme) -> ThemeFonts {
	match theme {
		Theme::Classic => ThemeFonts {
			main: Some("TeX Gyre Pagella"),
			sans: None
		},
		Theme::Modern => ThemeFonts {
			main: Some("TeX Gyre Termes"),
			sans: Some("TeX Gyre Heros")
		},
		Theme::Minimal => ThemeFonts::default()
	}
}

/// The metadata block which opens the annotated text
#[derive(Debug, Clone)]
pub struct MetadataHeader<'a> {
	title: &'a str,
	author: Option<&'a str>,
	subtitle: Option<&'a str>,
	papersize: &'static str,
	geometry: String,
	fonts: ThemeFonts,
	include_toc: bool,
	pagestyle: Option<&'static str>,
	header_includes: Option<String>
}

impl<'a> MetadataHeader<'a> {
	/// The metadata for exporting `manuscript` with `options`
	pub fn new(manuscript: &'a Manuscript, options: &ExportOptions) -> Self {
		let fonts = if options.engine.supports_system_fonts() {
			theme_fonts(manuscript.theme)
		} else {
			ThemeFonts::default()
		};
		// running headers set their own page style
		let pagestyle = match (options.include_headers, options.include_page_numbers) {
			(true, _) => None,
			(false, true) => Some("plain"),
			(false, false) => Some("empty")
		};
		MetadataHeader {
			title: manuscript.cover_title(),
			author: manuscript.cover_author(),
			subtitle: manuscript.subtitle(),
			papersize: options.page_size.latex_name(),
			geometry: manuscript.export_settings.margins.to_geometry(),
			fonts,
			include_toc: options.include_toc,
			pagestyle,
			header_includes: None
		}
	}

	/// Embed preamble commands in the metadata itself, for when no separate header file is used
	pub fn header_includes<S: Into<String>>(&mut self, commands: S) -> &mut Self {
		self.header_includes = Some(commands.into());
		self
	}

	/// Render as a yaml metadata block
	pub fn to_yaml(&self) -> String {
		let mut out = String::from("---\n");

		macro_rules! field {
			($name:expr, $value:expr) => {
				out.push_str($name);
				out.push_str(": ");
				out.push_str(&yaml_string($value));
				out.push('\n');
			};
		}

		field!("title", self.title);
		if let Some(author) = self.author {
			field!("author", author);
		}
		if let Some(subtitle) = self.subtitle {
			field!("subtitle", subtitle);
		}
		out.push_str(&format!("documentclass: {}\n", DOCUMENT_CLASS));
		out.push_str(&format!("fontsize: {}\n", FONT_SIZE));
		out.push_str(&format!("papersize: {}\n", self.papersize));
		field!("geometry", &self.geometry);
		if let Some(main) = self.fonts.main {
			field!("mainfont", main);
		}
		if let Some(sans) = self.fonts.sans {
			field!("sansfont", sans);
		}
		if self.include_toc {
			out.push_str("toc: true\n");
			out.push_str(&format!("toc-depth: {}\n", TOC_DEPTH));
		}
		if let Some(pagestyle) = self.pagestyle {
			out.push_str(&format!("pagestyle: {}\n", pagestyle));
		}
		if let Some(ref commands) = self.header_includes {
			out.push_str("header-includes: |\n  ```{=latex}\n");
			for line in commands.lines() {
				out.push_str("  ");
				out.push_str(line);
				out.push('\n');
			}
			out.push_str("  ```\n");
		}
		out.push_str("---\n");
		out
	}
}

fn yaml_string(s: &str) -> String {
	let mut quoted = String::with_capacity(s.len() + 2);
	quoted.push('"');
	for c in s.chars() {
		match c {
			'"' => quoted.push_str("\\\""),
			'\\' => quoted.push_str("\\\\"),
			'\n' | '\r' => quoted.push(' '),
			c => quoted.push(c)
		}
	}
	quoted.push('"');
	quoted
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineKind {
	Heading(u8),
	Blank,
	ListItem,
	/// fences, tables, quotes, raw html and images; never given a drop capital
	Verbatim,
	Paragraph
}

fn classify(line: &str) -> LineKind {
	if let Some((level, _)) = parse_heading(line) {
		return LineKind::Heading(level);
	}
	let trimmed = line.trim_start();
	if trimmed.is_empty() {
		LineKind::Blank
	} else if trimmed.starts_with('-') || trimmed.starts_with('*') {
		LineKind::ListItem
	} else if line.starts_with('\t')
		|| line.starts_with("    ")
		|| trimmed.starts_with("```")
		|| trimmed.starts_with("~~~")
		|| trimmed.starts_with(['|', '>', '<', '!'])
	{
		LineKind::Verbatim
	} else {
		LineKind::Paragraph
	}
}

/// Wrap the first character of `line` and the two after it in a drop capital directive.
/// A line shorter than three characters is wrapped as far as it goes.
/// ```
/// # use manuscript_latex::drop_cap;
/// assert_eq!(drop_cap("Hello world"), "\\lettrine{H}{el}lo world");
/// assert_eq!(drop_cap("Hi"), "\\lettrine{H}{i}");
/// ```
pub fn drop_cap(line: &str) -> String {
	let body = line.trim_start();
	let indent = &line[..line.len() - body.len()];
	let first_end = body.chars().next().map(char::len_utf8).unwrap_or(0);
	let rest_start = body[first_end..]
		.char_indices()
		.nth(2)
		.map(|(i, _)| first_end + i)
		.unwrap_or(body.len());
	format!(
		"{}\\lettrine{{{}}}{{{}}}{}",
		indent,
		escape_to_latex(&body[..first_end]),
		escape_to_latex(&body[first_end..rest_start]),
		&body[rest_start..]
	)
}

/// Insert page breaks and drop capitals into markdown text.
///
/// This is a single pass over the lines carrying one flag: whether a heading has been
/// seen with no paragraph line since. Headings set it, a paragraph line clears it
/// (taking the drop capital if it was set), and blank lines and list items leave it alone.
pub fn annotate_body(text: &str) -> String {
	let first_top_level = headings(text)
		.find(|heading| heading.level == 1)
		.map(|heading| heading.line);

	let (annotated, _) = text.split('\n').enumerate().fold(
		(String::with_capacity(text.len() + 64), false),
		|(mut out, after_heading), (index, raw)| {
			if index > 0 {
				out.push('\n');
			}
			let line = raw.trim_end_matches('\r');
			let after_heading = match classify(line) {
				LineKind::Heading(level) => {
					if level == 1 && Some(index) != first_top_level {
						out.push_str(PAGE_BREAK);
					}
					out.push_str(line);
					true
				},
				LineKind::Blank => after_heading,
				LineKind::ListItem => {
					out.push_str(line);
					after_heading
				},
				LineKind::Verbatim => {
					out.push_str(line);
					false
				},
				LineKind::Paragraph if after_heading => {
					out.push_str(&drop_cap(line));
					false
				},
				LineKind::Paragraph => {
					out.push_str(line);
					false
				}
			};
			(out, after_heading)
		}
	);
	annotated
}

/// The complete annotated text for `manuscript`: metadata block, then body.
/// The preamble commands the text relies on are embedded in the metadata,
/// so the result can be typeset on its own.
pub fn transform_manuscript(manuscript: &Manuscript, options: &ExportOptions) -> String {
	let mut metadata = MetadataHeader::new(manuscript, options);
	metadata.header_includes(header_commands(manuscript, options));
	annotated_text(&metadata, manuscript)
}

pub(crate) fn annotated_text(metadata: &MetadataHeader<'_>, manuscript: &Manuscript) -> String {
	let mut out = metadata.to_yaml();
	out.push('\n');
	out.push_str(&annotate_body(&manuscript.body_text()));
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use manuscript_ast::{ManuscriptBody, TypesetEngine};

	#[test]
	fn test_drop_cap_after_heading() {
		let out = annotate_body("# Title\n\nHello world");
		assert_eq!(out, "# Title\n\n\\lettrine{H}{el}lo world");
		assert_eq!(out.matches("\\lettrine").count(), 1);
	}

	#[test]
	fn test_page_break_before_later_top_level_headings() {
		let out = annotate_body("# A\n# B\nBody");
		assert_eq!(out.matches("\\newpage").count(), 1);
		assert!(out.starts_with("# A\n"));
		assert!(out.contains("\\newpage\n\n# B"));
		// the flag survives a heading directly after a heading
		assert!(out.ends_with("\\lettrine{B}{od}y"));
	}

	#[test]
	fn test_no_page_break_before_lower_levels() {
		let out = annotate_body("## Prologue\n\nText\n\n# One\n\n## Scene\n\nMore\n\n# Two");
		assert_eq!(out.matches("\\newpage").count(), 1);
		assert!(out.contains("\\newpage\n\n# Two"));
		assert!(!out.contains("\\newpage\n\n# One"));
	}

	#[test]
	fn test_drop_cap_fires_once_per_heading() {
		let out = annotate_body("# One\n\nFirst para.\nStill first.\n\nSecond para.\n\n## Two\n\nThird.");
		assert_eq!(out.matches("\\lettrine").count(), 2);
		assert!(out.contains("\\lettrine{F}{ir}st para."));
		assert!(out.contains("\nStill first."));
		assert!(out.contains("\\lettrine{T}{hi}rd."));
	}

	#[test]
	fn test_list_items_do_not_take_the_drop_cap() {
		let out = annotate_body("# One\n\n- item\n* other\n\nParagraph");
		assert!(out.contains("\n- item\n* other\n"));
		assert!(out.contains("\\lettrine{P}{ar}agraph"));
	}

	#[test]
	fn test_verbatim_lines_clear_the_flag() {
		let out = annotate_body("# One\n\n> quoted\n\nParagraph");
		assert!(!out.contains("\\lettrine"));
	}

	#[test]
	fn test_short_paragraph_still_fires() {
		assert_eq!(annotate_body("# T\nA"), "# T\n\\lettrine{A}{}");
		assert_eq!(annotate_body("# T\nOk"), "# T\n\\lettrine{O}{k}");
	}

	#[test]
	fn test_drop_cap_escapes_and_keeps_indent() {
		assert_eq!(drop_cap("  $5 bill"), "  \\lettrine{\\$}{5 }bill");
		assert_eq!(drop_cap("Élan vital"), "\\lettrine{É}{la}n vital");
	}

	#[test]
	fn test_text_without_headings_is_unchanged() {
		let text = "Just a paragraph.\n\nAnd another.\n";
		assert_eq!(annotate_body(text), text);
	}

	#[test]
	fn test_metadata_header() {
		let mut m = Manuscript::new("m1");
		m.title = "A \"Quoted\" Title".into();
		m.author = "A.N. Author".into();
		m.cover.subtitle = Some("Sub".into());
		let options = ExportOptions::default();
		let yaml = MetadataHeader::new(&m, &options).to_yaml();
		assert!(yaml.starts_with("---\n"));
		assert!(yaml.ends_with("---\n"));
		assert!(yaml.contains("title: \"A \\\"Quoted\\\" Title\"\n"));
		assert!(yaml.contains("author: \"A.N. Author\"\n"));
		assert!(yaml.contains("subtitle: \"Sub\"\n"));
		assert!(yaml.contains("documentclass: article\n"));
		assert!(yaml.contains("papersize: a4\n"));
		assert!(yaml.contains("geometry: \"top=20mm, bottom=20mm, left=20mm, right=20mm\"\n"));
		assert!(yaml.contains("toc: true\ntoc-depth: 2\n"));
		assert!(yaml.contains("pagestyle: plain\n"));
		assert!(yaml.contains("mainfont: \"TeX Gyre Pagella\"\n"));
	}

	#[test]
	fn test_metadata_header_toggles() {
		let mut m = Manuscript::new("m1");
		m.theme = Theme::Modern;
		let options = ExportOptions {
			include_toc: false,
			include_page_numbers: false,
			engine: TypesetEngine::Pdflatex,
			..ExportOptions::default()
		};
		let yaml = MetadataHeader::new(&m, &options).to_yaml();
		assert!(!yaml.contains("toc"));
		assert!(!yaml.contains("author:"));
		assert!(yaml.contains("pagestyle: empty\n"));
		// pdflatex cannot load system fonts by name
		assert!(!yaml.contains("mainfont"));

		let options = ExportOptions {
			include_headers: true,
			..ExportOptions::default()
		};
		let yaml = MetadataHeader::new(&m, &options).to_yaml();
		assert!(!yaml.contains("pagestyle"));
		assert!(yaml.contains("sansfont: \"TeX Gyre Heros\"\n"));
	}

	#[test]
	fn test_transform_manuscript() {
		let mut m = Manuscript::new("m1");
		m.body = ManuscriptBody::Continuous("# One\n\nOnce upon a time.\n\n# Two\n\nThe end.".into());
		let out = transform_manuscript(&m, &ExportOptions::default());
		let body_start = out.find("\n---\n\n").unwrap();
		assert!(out[..body_start].contains("header-includes: |\n  ```{=latex}\n  \\usepackage{lettrine}"));
		let body = &out[body_start + 6..];
		assert!(body.starts_with("# One\n\n\\lettrine{O}{nc}e upon a time."));
		assert_eq!(body.matches("\\newpage").count(), 1);
		assert!(body.ends_with("\\lettrine{T}{he} end."));
	}
}
