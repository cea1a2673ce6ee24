//! This crate prepares a `Manuscript` for typesetting through LaTeX, and runs the typesetter.
//!
//! Preparation is a pure text transformation: the markdown body is given a yaml
//! metadata block and annotated with page breaks and drop capitals (see `annotate_body`).
//! `TypesetRenderer` then writes the result to a scratch file and hands it to
//! `pandoc`, which in turn runs whichever LaTeX engine the export options name.
//!
//! ```
//! use manuscript_latex::annotate_body;
//!
//! let annotated = annotate_body("# Title\n\nHello world");
//! assert_eq!(annotated, "# Title\n\n\\lettrine{H}{el}lo world");
//! ```
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs)]

mod header;
mod transform;
mod typeset;
pub use header::{header_commands, PageStyle, RunningHeader};
pub use transform::{annotate_body, drop_cap, theme_fonts, transform_manuscript, MetadataHeader, ThemeFonts, PAGE_BREAK};
pub use typeset::{TypesetRenderer, DEFAULT_TYPESETTER};
