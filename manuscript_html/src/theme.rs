use manuscript_ast::{ColumnLayout, Theme};

static CLASSIC_CSS: &str = include_str!("themes/classic.css");
static MODERN_CSS: &str = include_str!("themes/modern.css");
static MINIMAL_CSS: &str = include_str!("themes/minimal.css");

/// Flow directive for two-column text
const DOUBLE_COLUMN_FLOW: &str = "column-count: 2; column-gap: 2em;";

/// The concrete styles a theme and column layout resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStyle {
    /// the theme actually used
    pub theme: Theme,
    /// typography, heading sizes and spacing
    pub stylesheet: &'static str,
    /// declarations for the body text container; `None` for a single column
    pub flow: Option<&'static str>,
}

impl ResolvedStyle {
    /// The css for the theme and any column flow, as one block
    pub fn to_css(&self) -> String {
        let mut css = String::from(self.stylesheet);
        if let Some(flow) = self.flow {
            css.push_str("\n.manuscript-body .content {\n\t");
            css.push_str(flow);
            css.push_str("\n}\n");
        }
        css
    }
}

/// The full stylesheet of a theme
pub fn theme_stylesheet(theme: Theme) -> &'static str {
    match theme {
        Theme::Classic => CLASSIC_CSS,
        Theme::Modern => MODERN_CSS,
        Theme::Minimal => MINIMAL_CSS,
    }
}

/// The content flow directive for a column layout
pub fn flow_directive(layout: ColumnLayout) -> Option<&'static str> {
    match layout {
        ColumnLayout::Single => None,
        ColumnLayout::Double => Some(DOUBLE_COLUMN_FLOW),
    }
}

/// Resolve a theme and layout to concrete styles
pub fn resolve_style(theme: Theme, layout: ColumnLayout) -> ResolvedStyle {
    ResolvedStyle {
        theme,
        stylesheet: theme_stylesheet(theme),
        flow: flow_directive(layout),
    }
}

/// Resolve stored identifiers; unknown identifiers fall back to the defaults
/// and this never fails
pub fn resolve_style_by_name(theme: &str, layout: &str) -> ResolvedStyle {
    resolve_style(Theme::resolve(theme), ColumnLayout::resolve(layout))
}
