#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

//! A set of utilites used across the export crates.
//!
//! Exports depend on two kinds of external program, both found through `PATH`
//! unless configured otherwise:
//! - a document typesetter (`pandoc`), which in turn drives one of `pdflatex`, `xelatex` or `lualatex`
//! - a headless Chromium-family browser, used to print html to pdf
//!
//! If used together with `manuscript_latex`, the LaTeX installation needs the
//! `lettrine`, `fancyhdr` and `geometry` packages.

use std::borrow::Cow;
use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use regex::Regex;
mod error;
pub mod process;
pub use error::ExportError;

lazy_static!{
	static ref HTML_FINDER: AhoCorasick = AhoCorasick::new(HTML_TARGET_CHARS)
		.expect("html escape patterns are valid");
	static ref LATEX_FINDER: AhoCorasick = AhoCorasick::new(LATEX_TARGET_CHARS)
		.expect("latex escape patterns are valid");
	static ref NON_ALPHANUMERIC: Regex = Regex::new("[^a-z0-9]+")
		.expect("filename pattern is valid");
}

static HTML_TARGET_CHARS: [&str; 5] = [
	"<",
	">",
	"&",
	"\"",
	"'"
];

static HTML_REPLACEMENTS: [&str; 5] = [
	"&lt;",
	"&gt;",
	"&amp;",
	"&quot;",
	"&#39;"
];

/// escape `input` for html output, in text or attribute position
pub fn escape_to_html<'a, S: Into<Cow<'a, str>>>(input: S) -> Cow<'a, str> {
	let input = input.into();
	if HTML_FINDER.is_match(&*input) {
		Cow::Owned(HTML_FINDER.replace_all(&*input, &HTML_REPLACEMENTS[..]))
	} else {
		input
	}
}

static LATEX_TARGET_CHARS: [&str; 16] = [
	"…",
	"–",
	"—",
	"\u{a0}",
	"&",
	"%",
	"$",
	"#",
	"_",
	"{",
	"}",
	"[",
	"]",
	"~",
	"^",
	"\\",
];

static LATEX_REPLACEMENTS: [&str; 16] = [
	"\\ldots{}",
	"--",
	"---",
	"~",
	"\\&",
	r"\%",
	r"\$",
	r"\#",
	r"\_",
	r"\{",
	r"\}",
	r"{[}",
	r"{]}",
	r"\textasciitilde{}",
	r"\textasciicircum{}",
	r"\textbackslash{}"
];

/// escape `input` for latex output
pub fn escape_to_latex<'a, S: Into<Cow<'a, str>>>(input: S) -> Cow<'a, str> {
	let input = input.into();
	if LATEX_FINDER.is_match(&*input) {
		Cow::Owned(LATEX_FINDER.replace_all(&*input, &LATEX_REPLACEMENTS[..]))
	} else {
		input
	}
}

/// Reduce a title to something safe to use as a filename:
/// lowercased, with every run of characters other than ascii letters and digits
/// collapsed to a single hyphen, and no hyphens at either end.
/// A title with nothing usable in it becomes `manuscript`.
/// ```
/// # use manuscript_common::sanitize_title;
/// assert_eq!(sanitize_title("My Great Novel: Part 2!"), "my-great-novel-part-2");
/// ```
pub fn sanitize_title(title: &str) -> String {
	let lowered = title.to_lowercase();
	let collapsed = NON_ALPHANUMERIC.replace_all(&lowered, "-");
	let trimmed = collapsed.trim_matches('-');
	if trimmed.is_empty() {
		"manuscript".to_string()
	} else {
		trimmed.to_string()
	}
}

/// The filename to suggest for an artifact made from a manuscript with this title
pub fn artifact_filename(title: &str, ext: &str) -> String {
	format!("{}.{}", sanitize_title(title), ext)
}
