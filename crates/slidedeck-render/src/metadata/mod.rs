//! Slide metadata: the frontmatter schema and its extraction.
//!
//! A slide document may start with a YAML frontmatter block:
//!
//! ```text
//! ---
//! theme: monomi
//! customLayout: .demo/layouts/intro.hbs
//! image: ./img/background.png
//! speaker: Jane
//! ---
//! # Welcome
//! ```
//!
//! Recognized keys decode into typed fields of [`SlideMetadata`]; anything
//! else (`speaker` above) is kept verbatim in [`SlideMetadata::extra`] so
//! templates can still read it.
//!
//! Decoding is per key. A scalar under a string key is stringified
//! (`title: 2024` reads as `"2024"`), and a value that does not fit its field
//! at all moves to `extra` instead of discarding the rest of the block. See
//! [`extract`] for the exact recognition rules.

mod extract;
mod inline;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

pub use extract::{extract, metadata_block, strip_metadata, Extracted};
pub use inline::parse_inline_props;

/// Layout name applied to slides that do not declare one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Decoded slide frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Built-in presentation theme name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Built-in layout name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Path of a template that wraps the rendered slide content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_layout: Option<String>,

    /// Path or `https://` URL of a stylesheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<String>,

    /// Background image path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,

    /// Seconds before the presentation advances on its own.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_seconds"
    )]
    pub auto_advance_after: Option<f64>,

    /// Slide-specific overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<Value>,

    /// Unrecognized keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for SlideMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::default()),
            Value::Mapping(mapping) => Ok(Self::from_mapping(mapping)),
            other => Err(serde::de::Error::custom(format!(
                "slide metadata must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// Whole seconds serialize as integers so templates print `5`, not `5.0`.
fn serialize_seconds<S: serde::Serializer>(
    seconds: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match seconds {
        Some(s) if s.fract() == 0.0 && *s <= u64::MAX as f64 => {
            serializer.serialize_u64(*s as u64)
        }
        Some(s) => serializer.serialize_f64(*s),
        None => serializer.serialize_none(),
    }
}

/// Reads a string field. Numbers and booleans are stringified; null is unset.
fn string_field(value: Value) -> Result<Option<String>, Value> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(other),
    }
}

/// Reads a duration in seconds from an integer, a float or a numeric string.
fn seconds_field(value: Value) -> Result<Option<f64>, Value> {
    let seconds = match &value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match seconds.filter(|s| s.is_finite() && *s >= 0.0) {
        Some(seconds) => Ok(Some(seconds)),
        None => Err(value),
    }
}

/// The subset of metadata whose change requires re-resolving templates,
/// themes and backgrounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionKey {
    pub theme: Option<String>,
    pub layout: Option<String>,
    pub custom_layout: Option<String>,
    pub custom_theme: Option<String>,
    pub image: Option<String>,
}

impl SlideMetadata {
    /// Decodes a YAML frontmatter block.
    ///
    /// An empty or `null` block decodes to the default value. Malformed YAML
    /// and documents that are not a mapping are errors; a mistyped key is not.
    pub fn from_yaml(block: &str) -> Result<Self, serde_yaml::Error> {
        if block.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(block)
    }

    /// Decodes a mapping key by key.
    ///
    /// Values that do not fit a recognized field are kept in `extra` under
    /// their original key.
    pub fn from_mapping(mapping: Mapping) -> Self {
        let mut meta = Self::default();
        for (key, value) in mapping {
            let key = match key {
                Value::String(key) => key,
                other => match string_field(other) {
                    Ok(Some(key)) => key,
                    _ => continue,
                },
            };
            let slot = match key.as_str() {
                "title" => &mut meta.title,
                "theme" => &mut meta.theme,
                "layout" => &mut meta.layout,
                "customLayout" => &mut meta.custom_layout,
                "customTheme" => &mut meta.custom_theme,
                "image" => &mut meta.image,
                "transition" => &mut meta.transition,
                "header" => &mut meta.header,
                "footer" => &mut meta.footer,
                "autoAdvanceAfter" => {
                    match seconds_field(value) {
                        Ok(seconds) => meta.auto_advance_after = seconds,
                        Err(value) => meta.keep_mistyped(key, value),
                    }
                    continue;
                }
                "slide" => {
                    meta.slide = Some(value).filter(|v| !v.is_null());
                    continue;
                }
                _ => {
                    meta.extra.insert(key, value);
                    continue;
                }
            };
            match string_field(value) {
                Ok(parsed) => *slot = parsed,
                Err(value) => meta.keep_mistyped(key, value),
            }
        }
        meta
    }

    fn keep_mistyped(&mut self, key: String, value: Value) {
        tracing::debug!(key = %key, "metadata value does not fit its field, keeping it as extra");
        self.extra.insert(key, value);
    }

    /// Returns `true` if no key, recognized or not, is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The layout name, falling back to [`DEFAULT_LAYOUT`].
    pub fn layout_or_default(&self) -> &str {
        self.layout.as_deref().unwrap_or(DEFAULT_LAYOUT)
    }

    /// Looks up an unrecognized key.
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Extracts the fields that drive layout, theme and background resolution.
    pub fn resolution_key(&self) -> ResolutionKey {
        ResolutionKey {
            theme: self.theme.clone(),
            layout: self.layout.clone(),
            custom_layout: self.custom_layout.clone(),
            custom_theme: self.custom_theme.clone(),
            image: self.image.clone(),
        }
    }

    /// Applies deck-level defaults from the document frontmatter.
    ///
    /// Document `theme`, `customTheme` and `customLayout` always win, while
    /// `transition`, `header`, `footer` and unrecognized keys only fill gaps.
    /// `layout`, `image`, `autoAdvanceAfter` and `slide` are never inherited.
    pub fn merge_document_defaults(&mut self, doc: &SlideMetadata) {
        if doc.theme.is_some() {
            self.theme = doc.theme.clone();
        }
        if doc.custom_theme.is_some() {
            self.custom_theme = doc.custom_theme.clone();
        }
        if doc.custom_layout.is_some() {
            self.custom_layout = doc.custom_layout.clone();
        }
        if self.transition.is_none() {
            self.transition = doc.transition.clone();
        }
        if self.header.is_none() {
            self.header = doc.header.clone();
        }
        if self.footer.is_none() {
            self.footer = doc.footer.clone();
        }
        if self.title.is_none() {
            self.title = doc.title.clone();
        }
        for (key, value) in &doc.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Overlays every key set in `other` onto `self`.
    pub fn overlay(&mut self, other: &SlideMetadata) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take!(
            title,
            theme,
            layout,
            custom_layout,
            custom_theme,
            image,
            transition,
            header,
            footer,
            auto_advance_after,
            slide
        );
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}
