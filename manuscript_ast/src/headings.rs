//! Recover the heading structure of a markdown text.
//!
//! A heading is any line of one to six `#` characters, then at least one space or tab,
//! then some title text. Nothing else is inspected: headings come out in the order
//! they appear, duplicates are kept, and levels may jump about freely.
//! The result depends on nothing but the text, so it is recomputed on every render
//! rather than being stored.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING_LINE: Regex =
        Regex::new(r"^(#{1,6})[ \t]+(\S.*?)[ \t]*$").expect("heading pattern is valid");
}

/// A heading found in a markdown text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadingNode<'a> {
    /// 1 to 6
    pub level: u8,
    /// the heading text, without its markers or surrounding whitespace
    pub title: &'a str,
    /// zero-based line number
    pub line: usize,
    /// byte offset of the start of the line
    pub offset: usize,
}

/// If `line` is a heading, return its level and title
/// ```
/// # use manuscript_ast::parse_heading;
/// assert_eq!(parse_heading("## Early Life"), Some((2, "Early Life")));
/// assert_eq!(parse_heading("#hashtag"), None);
/// ```
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let captures = HEADING_LINE.captures(line)?;
    let level = captures.get(1)?.as_str().len() as u8;
    let title = captures.get(2)?.as_str();
    Some((level, title))
}

/// Lazily iterate over the headings of `text`
pub fn headings(text: &str) -> Headings<'_> {
    Headings {
        src: text,
        offset: 0,
        line: 0,
    }
}

/// Iterator over the headings of a text, produced by `headings`
#[derive(Debug, Clone)]
pub struct Headings<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> Iterator for Headings<'a> {
    type Item = HeadingNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.src.len() {
            let rest = &self.src[self.offset..];
            let len = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
            let line_text = rest[..len].trim_end_matches('\n').trim_end_matches('\r');
            let (offset, line) = (self.offset, self.line);
            self.offset += len;
            self.line += 1;
            if let Some((level, title)) = parse_heading(line_text) {
                return Some(HeadingNode {
                    level,
                    title,
                    line,
                    offset,
                });
            }
        }
        None
    }
}

/// An entry in an on-screen table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    #[allow(missing_docs)]
    pub level: u8,
    #[allow(missing_docs)]
    pub title: String,
    /// indentation steps; a top-level heading is not indented
    pub indent: usize,
}

/// A flat table of contents for `text`
pub fn outline(text: &str) -> Vec<OutlineEntry> {
    headings(text)
        .map(|heading| OutlineEntry {
            level: heading.level,
            title: heading.title.to_string(),
            indent: usize::from(heading.level - 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_headings_in_order() {
        let text = "# One\ntext\n### Three\n## Two\n# One\n";
        let found = headings(text).map(|h| (h.level, h.title)).collect::<Vec<_>>();
        assert_eq!(found, vec![(1, "One"), (3, "Three"), (2, "Two"), (1, "One")]);
    }

    #[test]
    fn requires_whitespace_and_title() {
        for line in ["#NoSpace", "#", "#   ", "####### Seven", " # Indented", "text # not"] {
            assert_eq!(parse_heading(line), None, "{:?} should not be a heading", line);
        }
        assert_eq!(parse_heading("######\tSix"), Some((6, "Six")));
        assert_eq!(parse_heading("#  Padded title  "), Some((1, "Padded title")));
    }

    #[test]
    fn records_line_and_offset() {
        let text = "intro\r\n\r\n## Second\r\nbody";
        let heading = headings(text).next().unwrap();
        assert_eq!(heading.line, 2);
        assert_eq!(heading.offset, 9);
        assert_eq!(heading.title, "Second");
        assert_eq!(&text[heading.offset..heading.offset + 2], "##");
    }

    #[test]
    fn count_matches_heading_lines() {
        let text = "# A\n\n#B\n## C\nplain\n####### D\n###### E";
        let expected = text.lines().filter(|l| parse_heading(l).is_some()).count();
        assert_eq!(headings(text).count(), expected);
        assert_eq!(expected, 3);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let text = "# A\n## B\ntext\n# C";
        let first = headings(text).collect::<Vec<_>>();
        let second = headings(text).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_text_has_no_headings() {
        assert_eq!(headings("").count(), 0);
        assert!(outline("").is_empty());
    }

    #[test]
    fn outline_indents_by_level() {
        let entries = outline("# Part\n### Deep\n## Chapter");
        let indents = entries
            .iter()
            .map(|e| (e.title.as_str(), e.indent))
            .collect::<Vec<_>>();
        assert_eq!(indents, vec![("Part", 0), ("Deep", 2), ("Chapter", 1)]);
    }
}
