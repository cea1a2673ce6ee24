//! This crate turns a `Manuscript` into a single styled html document,
//! and can print that document to pdf in a headless browser.
//!
//! ```
//! use manuscript_ast::{Manuscript, ManuscriptBody};
//! use manuscript_html::{assemble_document, resolve_style, InclusionFlags};
//!
//! let mut manuscript = Manuscript::new("draft-1");
//! manuscript.body = ManuscriptBody::Continuous("# Greetings\n\nHello world...".into());
//! let style = resolve_style(manuscript.theme, manuscript.layout);
//! let flags = InclusionFlags { include_cover: false, include_toc: true };
//! let html = assemble_document(&manuscript, &style, flags);
//! assert!(html.contains("<h1>Greetings</h1>"));
//! ```
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

mod assemble;
mod browser;
mod theme;
pub use assemble::{
    assemble_document, assemble_print_document, print_stylesheet, render_markdown,
    InclusionFlags,
};
pub use browser::{BrowserRenderer, DEFAULT_LOAD_TIMEOUT, DEFAULT_SETTLE_DELAY, DEFAULT_VIEWPORT};
pub use theme::{flow_directive, resolve_style, resolve_style_by_name, theme_stylesheet, ResolvedStyle};
