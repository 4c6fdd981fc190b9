//! Color mode detection.
//!
//! When the host does not report a theme, code highlighting follows the OS
//! light/dark preference. Use [`set_theme_detector`] to override detection
//! for testing.
//!
//! ```rust
//! use slidedeck_render::theme::{detect_color_mode, set_theme_detector, ColorMode};
//!
//! set_theme_detector(|| ColorMode::Dark);
//! assert_eq!(detect_color_mode(), ColorMode::Dark);
//! ```

use std::sync::Mutex;

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};
use once_cell::sync::Lazy;

/// The user's preferred color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Light,
    Dark,
}

type ThemeDetector = fn() -> ColorMode;

static THEME_DETECTOR: Lazy<Mutex<ThemeDetector>> = Lazy::new(|| Mutex::new(os_theme_detector));

/// Overrides the detector used to determine the color mode.
pub fn set_theme_detector(detector: ThemeDetector) {
    let mut guard = THEME_DETECTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = detector;
}

/// Restores OS-based detection.
pub fn reset_theme_detector() {
    set_theme_detector(os_theme_detector);
}

/// Detects the preferred color mode through the configured detector.
pub fn detect_color_mode() -> ColorMode {
    let detector = THEME_DETECTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    (*detector)()
}

// Undetectable preferences count as light.
fn os_theme_detector() -> ColorMode {
    match detect_os_theme() {
        Ok(OsThemeMode::Dark) => ColorMode::Dark,
        Ok(_) => ColorMode::Light,
        Err(err) => {
            tracing::debug!(error = %err, "OS color mode detection failed");
            ColorMode::Light
        }
    }
}
