//! Rendering configuration.
//!
//! Every field has a default, so an empty YAML document (or no config at all)
//! yields the standard 960×540 canvas with a 2.5 scale ceiling.
//!
//! ```rust
//! use slidedeck_render::RenderConfig;
//!
//! let config = RenderConfig::from_yaml(r#"
//! scaleCeiling: 3.0
//! baseUrl: https://host.local/workspace
//! diagramLanguages: [mermaid, dot]
//! "#).unwrap();
//!
//! assert_eq!(config.canvas.width, 960.0);
//! assert_eq!(config.scale_ceiling, 3.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::preprocess::COLUMN_MARKER;
use crate::scale::{CanvasSize, DEFAULT_CEILING};
use crate::template::TemplateSyntax;

/// Name of the CSS custom property that carries the scale factor.
pub const DEFAULT_SCALE_VARIABLE: &str = "--slide-scale";

/// Configuration shared by the pipeline, the view and the scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Logical slide canvas.
    pub canvas: CanvasSize,
    /// Largest scale factor the canvas may be blown up to.
    pub scale_ceiling: f64,
    /// CSS custom property receiving the scale factor.
    pub scale_variable: String,
    /// Marker splitting a body into two columns.
    pub column_marker: String,
    /// Code block languages rendered as diagrams by the host.
    pub diagram_languages: Vec<String>,
    /// Root URL that relative resources are joined to.
    pub base_url: Option<String>,
    /// Syntax of custom layout files.
    pub template_syntax: TemplateSyntax,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            scale_ceiling: DEFAULT_CEILING,
            scale_variable: DEFAULT_SCALE_VARIABLE.to_string(),
            column_marker: COLUMN_MARKER.to_string(),
            diagram_languages: vec!["mermaid".to_string()],
            base_url: None,
            template_syntax: TemplateSyntax::default(),
        }
    }
}

impl RenderConfig {
    /// Parses a configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Sets the base URL, returning `self` for chaining.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}
