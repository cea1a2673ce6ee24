//! Compose a manuscript into one self-contained html document.
//!
//! The document has up to three sections, always in this order:
//! a cover, a table of contents and the body. Cover and contents are each
//! followed by a forced page break, and the body starts on a new page with
//! every top-level heading inside it starting another.

use crate::theme::ResolvedStyle;
use manuscript_ast::{headings, ExportOptions, ExportSettings, Manuscript};
use manuscript_common::escape_to_html;
use pulldown_cmark::{html, Options, Parser};

/// indentation of each table of contents entry per heading level
const TOC_INDENT_PX: usize = 20;

/// Layout rules shared by every theme
static BASE_CSS: &str = r#"
* {
	box-sizing: border-box;
}

.cover {
	min-height: 90vh;
	display: flex;
	flex-direction: column;
	justify-content: center;
	align-items: center;
	text-align: center;
	background-size: cover;
	background-position: center;
	page-break-after: always;
	break-after: page;
}

.cover h1 {
	margin: 0 0 0.5em;
}

.cover .subtitle {
	font-size: 1.5em;
	margin: 0 0 2em;
}

.cover .author {
	font-size: 1.4em;
}

.toc {
	page-break-after: always;
	break-after: page;
}

.toc ul {
	list-style: none;
	padding: 0;
}

.toc li {
	margin-top: 0.3em;
}

.manuscript-body {
	page-break-before: always;
	break-before: page;
}

.manuscript-body h1 {
	page-break-before: always;
	break-before: page;
}

table {
	border-collapse: collapse;
	width: 100%;
	margin: 1em 0;
}

th, td {
	border: 1px solid #888;
	padding: 0.3em 0.6em;
}

table, tr {
	page-break-inside: auto;
	break-inside: auto;
}

img {
	max-width: 100%;
	height: auto;
}
"#;

/// Which optional sections a document includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionFlags {
    #[allow(missing_docs)]
    pub include_cover: bool,
    #[allow(missing_docs)]
    pub include_toc: bool,
}

impl From<&ExportOptions> for InclusionFlags {
    fn from(options: &ExportOptions) -> Self {
        InclusionFlags {
            include_cover: options.include_cover,
            include_toc: options.include_toc,
        }
    }
}

impl From<&ExportSettings> for InclusionFlags {
    fn from(settings: &ExportSettings) -> Self {
        InclusionFlags {
            include_cover: settings.include_cover,
            include_toc: settings.include_toc,
        }
    }
}

/// Render markdown to an html fragment
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn cover_section(manuscript: &Manuscript) -> String {
    let mut cover = String::from("<section class=\"cover\"");
    if let Some(image) = manuscript
        .cover
        .background_image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        cover.push_str(" style=\"background-image: url(&quot;");
        cover.push_str(&escape_to_html(image.trim()));
        cover.push_str("&quot;);\"");
    }
    cover.push_str(">\n");
    cover.push_str(&format!(
        "\t<h1 class=\"title\">{}</h1>\n",
        escape_to_html(manuscript.cover_title())
    ));
    if let Some(subtitle) = manuscript.subtitle() {
        cover.push_str(&format!(
            "\t<p class=\"subtitle\">{}</p>\n",
            escape_to_html(subtitle)
        ));
    }
    if let Some(author) = manuscript.cover_author() {
        cover.push_str(&format!(
            "\t<p class=\"author\">{}</p>\n",
            escape_to_html(author)
        ));
    }
    cover.push_str("</section>\n");
    cover
}

fn toc_section(text: &str) -> String {
    let mut toc = String::from("<nav class=\"toc\">\n\t<h2>Contents</h2>\n\t<ul>\n");
    for heading in headings(text) {
        toc.push_str(&format!(
            "\t\t<li class=\"toc-level-{}\" style=\"margin-left: {}px\">{}</li>\n",
            heading.level,
            usize::from(heading.level) * TOC_INDENT_PX,
            escape_to_html(heading.title)
        ));
    }
    toc.push_str("\t</ul>\n</nav>\n");
    toc
}

fn body_section(text: &str) -> String {
    let mut body = String::from("<main class=\"manuscript-body\">\n<div class=\"content\">\n");
    body.push_str(&render_markdown(text));
    body.push_str("</div>\n</main>\n");
    body
}

fn write_document(
    manuscript: &Manuscript,
    style: &ResolvedStyle,
    flags: InclusionFlags,
    extra_css: Option<&str>,
) -> String {
    let text = manuscript.body_text();
    let mut doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    doc.push_str("\t<meta charset=\"utf-8\">\n");
    doc.push_str(&format!(
        "\t<title>{}</title>\n",
        escape_to_html(&manuscript.title)
    ));
    doc.push_str("\t<style>");
    doc.push_str(BASE_CSS);
    doc.push_str(&style.to_css());
    if let Some(extra) = extra_css {
        doc.push_str(extra);
    }
    doc.push_str("\t</style>\n</head>\n<body>\n");

    if flags.include_cover {
        doc.push_str(&cover_section(manuscript));
    }
    if flags.include_toc {
        doc.push_str(&toc_section(&text));
    }
    doc.push_str(&body_section(&text));
    doc.push_str("</body>\n</html>\n");
    doc
}

/// Assemble the styled html document for `manuscript`.
/// This is pure: the same inputs always give the same text.
pub fn assemble_document(
    manuscript: &Manuscript,
    style: &ResolvedStyle,
    flags: InclusionFlags,
) -> String {
    write_document(manuscript, style, flags, None)
}

/// Quote `text` as a css string literal
fn css_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' | '\r' => quoted.push(' '),
            // keeps a stray `</style>` from closing the stylesheet
            '<' => quoted.push_str("\\3c "),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// The `@page` rules for printing with `options`.
/// Page numbers and running heads are drawn in the page margins from here,
/// never by the browser's own header and footer.
pub fn print_stylesheet(manuscript: &Manuscript, options: &ExportOptions) -> String {
    let mut page = format!(
        "\n@page {{\n\tsize: {};\n\tmargin: {};\n",
        options.page_size.css_name(),
        manuscript.export_settings.margins.to_css()
    );
    if options.include_headers {
        if let Some(author) = manuscript.cover_author() {
            page.push_str(&format!(
                "\t@top-left {{\n\t\tcontent: {};\n\t}}\n",
                css_string(author)
            ));
        }
        page.push_str(&format!(
            "\t@top-right {{\n\t\tcontent: {};\n\t}}\n",
            css_string(&manuscript.title)
        ));
    }
    if options.include_page_numbers {
        page.push_str("\t@bottom-center {\n\t\tcontent: counter(page);\n\t}\n");
    }
    page.push_str("}\n\nhtml {\n\t-webkit-print-color-adjust: exact;\n\tprint-color-adjust: exact;\n}\n");
    page
}

/// Assemble the document as `assemble_document` does, with print rules for paper size and margins added
pub fn assemble_print_document(
    manuscript: &Manuscript,
    style: &ResolvedStyle,
    options: &ExportOptions,
) -> String {
    let print_css = print_stylesheet(manuscript, options);
    write_document(manuscript, style, options.into(), Some(&print_css))
}
