//! Presentation and code highlighting themes.
//!
//! The host describes its active color theme with a [`ThemeDescription`].
//! [`HighlightTheme::resolve`] turns that into a syntect theme for code
//! blocks, falling back on the OS color mode (see [`detect_color_mode`]).

mod highlight;
mod mode;

use serde::{Deserialize, Serialize};

pub(crate) use highlight::SYNTAX_SET;
pub use highlight::{
    fallback_name, HighlightTheme, DARK_FALLBACK, HIGH_CONTRAST_FALLBACK,
    HIGH_CONTRAST_LIGHT_FALLBACK, LIGHT_FALLBACK,
};
pub use mode::{detect_color_mode, reset_theme_detector, set_theme_detector, ColorMode};

/// Brightness class of the host's color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeKind {
    Light,
    Dark,
    HighContrast,
    HighContrastLight,
}

/// The host's active color theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDescription {
    pub name: String,
    pub kind: ThemeKind,
    /// TextMate theme source, when the host can provide it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tm_theme: Option<String>,
}
