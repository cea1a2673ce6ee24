use manuscript_ast::{ExportOptions, Manuscript};
use manuscript_common::escape_to_latex;
use std::borrow::Cow;

static BASE_HEADER: &str = include_str!("resources/header.tex");

/// One row of running text, at the top or bottom of each page
#[derive(Debug, Clone, Default)]
pub struct RunningHeader {
	left: Option<Cow<'static, str>>,
	centre: Option<Cow<'static, str>>,
	right: Option<Cow<'static, str>>
}

impl RunningHeader {
	fn to_preamble_commands(&self, is_footer: bool) -> String {
		let cmd = if is_footer {
			"\\fancyfoot"
		} else {
			"\\fancyhead"
		};

		let mut out = String::new();

		macro_rules! running {
			($field:ident, $code:expr) => {
				out.push_str(cmd);
				out.push('[');
				out.push_str($code);
				out.push(']');
				match self.$field {
					Some(ref t) => {
						out.push_str("{{");
						out.push_str(t);
						out.push_str("}}\n");
					},
					None => out.push_str("{}\n")
				}
			};
		}

		running!(left, "L");
		running!(centre, "C");
		running!(right, "R");

		out
	}
}

/// Running headers and footers for every page
#[derive(Debug, Clone, Default)]
pub struct PageStyle {
	header: RunningHeader,
	footer: RunningHeader
}

impl PageStyle {
	/// Author on the left and title on the right of each header,
	/// with the page number centred below if it is wanted
	pub fn running(title: &str, author: Option<&str>, page_numbers: bool) -> Self {
		let mut style = PageStyle::default();
		style.header.left = author.map(|a| Cow::Owned(escape_to_latex(a).into_owned()));
		style.header.right = Some(Cow::Owned(escape_to_latex(title).into_owned()));
		if page_numbers {
			style.footer.centre = Some(Cow::Borrowed("\\thepage"));
		}
		style
	}

	fn to_preamble_commands(&self) -> String {
		let mut commands = String::from("\\usepackage{fancyhdr}\n\\pagestyle{fancy}\n\\fancyhf{}\n");
		commands.push_str(&self.header.to_preamble_commands(false));
		commands.push_str(&self.footer.to_preamble_commands(true));
		commands.push_str("\\renewcommand{\\headrulewidth}{0.4pt}\n");
		commands
	}
}

/// The LaTeX to load in the preamble of a typeset manuscript:
/// packages the annotated text relies on, and running headers if they are wanted
pub fn header_commands(manuscript: &Manuscript, options: &ExportOptions) -> String {
	let mut header = String::from(BASE_HEADER);
	if options.include_headers {
		let style = PageStyle::running(
			&manuscript.title,
			manuscript.cover_author(),
			options.include_page_numbers
		);
		header.push_str(&style.to_preamble_commands());
	}
	header
}
