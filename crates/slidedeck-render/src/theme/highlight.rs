//! Syntax highlighting themes.
//!
//! A [`HighlightTheme`] is resolved from the host's [`ThemeDescription`] in
//! order of precedence:
//!
//! 1. the embedded TextMate theme source, when it parses;
//! 2. a bundled syntect theme with the same name;
//! 3. a bundled fallback chosen by the theme kind, or by the detected
//!    OS color mode when the host reports nothing.

use std::io::Cursor;

use once_cell::sync::Lazy;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use super::mode::{detect_color_mode, ColorMode};
use super::{ThemeDescription, ThemeKind};
use crate::error::RenderError;

pub(crate) static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

pub const DARK_FALLBACK: &str = "base16-ocean.dark";
pub const LIGHT_FALLBACK: &str = "InspiredGitHub";
pub const HIGH_CONTRAST_FALLBACK: &str = "base16-eighties.dark";
pub const HIGH_CONTRAST_LIGHT_FALLBACK: &str = "Solarized (light)";

/// Bundled theme name used when nothing more specific is known.
pub fn fallback_name(kind: Option<ThemeKind>) -> &'static str {
    match kind {
        Some(ThemeKind::Dark) => DARK_FALLBACK,
        Some(ThemeKind::Light) => LIGHT_FALLBACK,
        Some(ThemeKind::HighContrast) => HIGH_CONTRAST_FALLBACK,
        Some(ThemeKind::HighContrastLight) => HIGH_CONTRAST_LIGHT_FALLBACK,
        None => match detect_color_mode() {
            ColorMode::Dark => DARK_FALLBACK,
            ColorMode::Light => LIGHT_FALLBACK,
        },
    }
}

/// A resolved syntect theme.
#[derive(Debug, Clone)]
pub struct HighlightTheme {
    name: String,
    theme: Theme,
}

impl HighlightTheme {
    /// Looks up a bundled syntect theme.
    pub fn named(name: &str) -> Option<Self> {
        THEME_SET.themes.get(name).map(|theme| Self {
            name: name.to_string(),
            theme: theme.clone(),
        })
    }

    /// Parses a TextMate (`.tmTheme`) source.
    pub fn from_tm_theme(name: &str, source: &str) -> Result<Self, RenderError> {
        let theme = ThemeSet::load_from_reader(&mut Cursor::new(source.as_bytes()))
            .map_err(|err| RenderError::HighlightError(format!("{name}: {err}")))?;
        Ok(Self {
            name: name.to_string(),
            theme,
        })
    }

    /// The bundled fallback for a theme kind (`None` consults the OS mode).
    pub fn fallback(kind: Option<ThemeKind>) -> Self {
        let name = fallback_name(kind);
        Self::named(name).unwrap_or_else(|| Self {
            name: name.to_string(),
            theme: Theme::default(),
        })
    }

    /// Resolves the theme for a host description.
    pub fn resolve(description: Option<&ThemeDescription>) -> Self {
        let Some(description) = description else {
            return Self::fallback(None);
        };

        if let Some(source) = description.tm_theme.as_deref() {
            match Self::from_tm_theme(&description.name, source) {
                Ok(theme) => return theme,
                Err(err) => tracing::warn!(error = %err, "ignoring unparsable tmTheme"),
            }
        }

        Self::named(&description.name).unwrap_or_else(|| Self::fallback(Some(description.kind)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

impl Default for HighlightTheme {
    fn default() -> Self {
        Self::fallback(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{reset_theme_detector, set_theme_detector};
    use serial_test::serial;

    const MINIMAL_TM_THEME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>name</key>
    <string>Tiny</string>
    <key>settings</key>
    <array>
        <dict>
            <key>settings</key>
            <dict>
                <key>background</key>
                <string>#101010</string>
                <key>foreground</key>
                <string>#EEEEEE</string>
            </dict>
        </dict>
    </array>
</dict>
</plist>"#;

    fn description(name: &str, kind: ThemeKind, tm_theme: Option<&str>) -> ThemeDescription {
        ThemeDescription {
            name: name.to_string(),
            kind,
            tm_theme: tm_theme.map(str::to_string),
        }
    }

    #[test]
    fn test_fallback_names_are_bundled() {
        for name in [
            DARK_FALLBACK,
            LIGHT_FALLBACK,
            HIGH_CONTRAST_FALLBACK,
            HIGH_CONTRAST_LIGHT_FALLBACK,
        ] {
            assert!(HighlightTheme::named(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_tm_theme_source_wins() {
        let desc = description("Tiny", ThemeKind::Light, Some(MINIMAL_TM_THEME));
        let theme = HighlightTheme::resolve(Some(&desc));
        assert_eq!(theme.name(), "Tiny");
        assert!(theme.theme().settings.background.is_some());
    }

    #[test]
    fn test_bundled_name_is_used() {
        let desc = description("Solarized (dark)", ThemeKind::Light, None);
        assert_eq!(HighlightTheme::resolve(Some(&desc)).name(), "Solarized (dark)");
    }

    #[test]
    fn test_unknown_name_falls_back_by_kind() {
        let desc = description("Night Owl", ThemeKind::Dark, Some("not a plist"));
        assert_eq!(HighlightTheme::resolve(Some(&desc)).name(), DARK_FALLBACK);

        let desc = description("Quiet Light", ThemeKind::HighContrastLight, None);
        assert_eq!(
            HighlightTheme::resolve(Some(&desc)).name(),
            HIGH_CONTRAST_LIGHT_FALLBACK
        );
    }

    #[test]
    #[serial]
    fn test_no_description_follows_color_mode() {
        set_theme_detector(|| ColorMode::Dark);
        assert_eq!(HighlightTheme::resolve(None).name(), DARK_FALLBACK);

        set_theme_detector(|| ColorMode::Light);
        assert_eq!(HighlightTheme::resolve(None).name(), LIGHT_FALLBACK);

        reset_theme_detector();
    }
}
