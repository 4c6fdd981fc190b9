//! Compact `key: value` props written on a slide delimiter line.
//!
//! ```text
//! --- layout: intro theme: "night owl" ---
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Number, Value};

use super::SlideMetadata;

static PROPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+):\s*("[^"]*"|'[^']*'|[^\s]+)"#).expect("valid inline props regex")
});

fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<u64>() {
                Value::Number(Number::from(n))
            } else if let Ok(n) = raw.parse::<i64>() {
                Value::Number(Number::from(n))
            } else if let Some(n) = raw.parse::<f64>().ok().filter(|n| n.is_finite()) {
                Value::Number(Number::from(n))
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

/// Decodes inline delimiter props into metadata.
///
/// Quoted values keep their spaces. `true`/`false` become booleans and numeric
/// values become numbers, except for keys whose schema type is a string.
/// A value that does not fit its key is kept in `extra`.
///
/// ```rust
/// use slidedeck_render::metadata::parse_inline_props;
///
/// let meta = parse_inline_props(r#"layout: intro title: "Hello world""#);
/// assert_eq!(meta.layout.as_deref(), Some("intro"));
/// assert_eq!(meta.title.as_deref(), Some("Hello world"));
/// ```
pub fn parse_inline_props(content: &str) -> SlideMetadata {
    if content.trim().is_empty() {
        return SlideMetadata::default();
    }

    let mut mapping = Mapping::new();
    for caps in PROPS_RE.captures_iter(content) {
        let key = &caps[1];
        let raw = unquote(&caps[2]);
        let value = match key {
            "title" | "theme" | "layout" | "customLayout" | "customTheme" | "image"
            | "transition" | "header" | "footer" => Value::String(raw.to_string()),
            _ => scalar(raw),
        };
        mapping.insert(Value::String(key.to_string()), value);
    }

    SlideMetadata::from_mapping(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_props() {
        assert!(parse_inline_props("   ").is_empty());
    }

    #[test]
    fn test_scalars_are_typed() {
        let meta = parse_inline_props("autoAdvanceAfter: 10 draft: true ratio: 1.5");
        assert_eq!(meta.auto_advance_after, Some(10.0));
        assert_eq!(meta.get_extra("draft"), Some(&Value::Bool(true)));
        assert!(meta.get_extra("ratio").unwrap().is_f64());
    }

    #[test]
    fn test_string_keys_stay_strings() {
        let meta = parse_inline_props("title: 2024 layout: 'two column'");
        assert_eq!(meta.title.as_deref(), Some("2024"));
        assert_eq!(meta.layout.as_deref(), Some("two column"));
    }

    #[test]
    fn test_mistyped_value_kept_as_extra() {
        let meta = parse_inline_props("autoAdvanceAfter: soon layout: intro");
        assert_eq!(meta.auto_advance_after, None);
        assert_eq!(
            meta.get_extra("autoAdvanceAfter"),
            Some(&Value::String("soon".into()))
        );
        assert_eq!(meta.layout.as_deref(), Some("intro"));
    }
}
