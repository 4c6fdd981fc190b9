//! Custom layout rendering.
//!
//! A custom layout wraps the rendered slide body. The template sees two
//! variables: `metadata` (the slide's frontmatter, plus `webViewUrl` when a
//! base URL is configured) and `content` (the body serialized to markup).
//! Handlebars layouts interpolate the body unescaped with `{{{content}}}`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::engine::{TemplateEngine, TemplateSyntax};
use crate::error::RenderError;
use crate::metadata::SlideMetadata;
use crate::resolve::{resolve_image_sources, ResourceResolver};

/// `type` value that makes the host's utility-CSS engine reprocess a block.
pub const UTILITY_STYLE_TYPE: &str = "text/tailwindcss";

static STYLE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<style(\s[^>]*)?>").expect("valid style regex"));
static TYPE_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\btype\s*="#).expect("valid type attr regex"));

/// Variables available to a layout template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext {
    pub metadata: serde_json::Value,
    pub content: String,
}

impl TemplateContext {
    /// Builds the context for one render.
    pub fn new(
        metadata: &SlideMetadata,
        content: impl Into<String>,
        web_view_url: Option<&str>,
    ) -> Result<Self, RenderError> {
        let mut metadata = serde_json::to_value(metadata)?;
        if let (Some(url), serde_json::Value::Object(map)) = (web_view_url, &mut metadata) {
            map.insert("webViewUrl".to_string(), url.into());
        }
        Ok(Self {
            metadata,
            content: content.into(),
        })
    }

    fn to_value(&self) -> Result<serde_json::Value, RenderError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Marks `<style>` blocks without a `type` for the utility-CSS engine.
pub fn mark_utility_styles(markup: &str) -> Cow<'_, str> {
    STYLE_OPEN_RE.replace_all(markup, |caps: &Captures| {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        if TYPE_ATTR_RE.is_match(attrs) {
            caps[0].to_string()
        } else {
            format!("<style type=\"{}\"{}>", UTILITY_STYLE_TYPE, attrs)
        }
    })
}

/// Renders slide content through a custom layout.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::metadata::SlideMetadata;
/// use slidedeck_render::template::{LayoutRenderer, TemplateContext};
///
/// let renderer = LayoutRenderer::default();
/// let meta = SlideMetadata { title: Some("Intro".into()), ..Default::default() };
/// let ctx = TemplateContext::new(&meta, "<p>Hi</p>", None).unwrap();
///
/// let html = renderer
///     .render("<style>h1{}</style><h1>{{metadata.title}}</h1>{{{content}}}", &ctx)
///     .unwrap();
/// assert_eq!(
///     html,
///     r#"<style type="text/tailwindcss">h1{}</style><h1>Intro</h1><p>Hi</p>"#
/// );
/// ```
pub struct LayoutRenderer {
    engine: Box<dyn TemplateEngine>,
    resolver: ResourceResolver,
}

impl LayoutRenderer {
    /// Creates a renderer for Handlebars layouts.
    pub fn new(resolver: ResourceResolver) -> Self {
        Self::with_syntax(TemplateSyntax::Handlebars, resolver)
    }

    pub fn with_syntax(syntax: TemplateSyntax, resolver: ResourceResolver) -> Self {
        Self::with_engine(syntax.engine(), resolver)
    }

    /// Uses a different template backend.
    pub fn with_engine(engine: Box<dyn TemplateEngine>, resolver: ResourceResolver) -> Self {
        Self { engine, resolver }
    }

    /// Compiles a layout and keeps it under `name` for [`render_loaded`].
    ///
    /// [`render_loaded`]: LayoutRenderer::render_loaded
    pub fn load(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.engine.add_template(name, source)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Compiles and renders a layout source in one step.
    pub fn render(&self, source: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        let raw = self.engine.render_template(source, &ctx.to_value()?)?;
        Ok(self.finish(&raw))
    }

    /// Renders a layout previously compiled with [`load`](Self::load).
    pub fn render_loaded(&self, name: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        let raw = self.engine.render_named(name, &ctx.to_value()?)?;
        Ok(self.finish(&raw))
    }

    fn finish(&self, raw: &str) -> String {
        let marked = mark_utility_styles(raw);
        resolve_image_sources(&marked, &self.resolver).into_owned()
    }
}

impl Default for LayoutRenderer {
    fn default() -> Self {
        Self::new(ResourceResolver::passthrough())
    }
}

impl std::fmt::Debug for LayoutRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutRenderer")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(yaml: &str) -> SlideMetadata {
        SlideMetadata::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_mark_utility_styles() {
        let out = mark_utility_styles(
            "<style>a{}</style><STYLE media=\"print\">b{}</STYLE><style type=\"text/css\">c{}</style>",
        );
        assert_eq!(
            out,
            "<style type=\"text/tailwindcss\">a{}</style>\
             <style type=\"text/tailwindcss\" media=\"print\">b{}</STYLE>\
             <style type=\"text/css\">c{}</style>"
        );
    }

    #[test]
    fn test_mark_utility_styles_without_styles_borrows() {
        assert!(matches!(mark_utility_styles("<p>x</p>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_context_carries_web_view_url_and_extra_keys() {
        let ctx = TemplateContext::new(
            &meta("theme: dark\nspeaker: Jane"),
            "<p/>",
            Some("https://host.local/ws"),
        )
        .unwrap();
        assert_eq!(ctx.metadata["theme"], "dark");
        assert_eq!(ctx.metadata["speaker"], "Jane");
        assert_eq!(ctx.metadata["webViewUrl"], "https://host.local/ws");
    }

    #[test]
    fn test_render_loaded_resolves_images() {
        let mut renderer = LayoutRenderer::new(ResourceResolver::new("https://host.local/ws"));
        renderer
            .load(
                ".demo/layouts/intro.hbs",
                r#"<img src="{{metadata.image}}">{{#if (eq metadata.layout "intro")}}{{{content}}}{{/if}}"#,
            )
            .unwrap();
        assert!(renderer.is_loaded(".demo/layouts/intro.hbs"));

        let ctx = TemplateContext::new(&meta("layout: intro\nimage: bg.png"), "<p>c</p>", None)
            .unwrap();
        let html = renderer.render_loaded(".demo/layouts/intro.hbs", &ctx).unwrap();
        assert_eq!(html, r#"<img src="https://host.local/ws/bg.png"><p>c</p>"#);
    }

    #[test]
    fn test_compile_failure() {
        let renderer = LayoutRenderer::default();
        let ctx = TemplateContext::new(&SlideMetadata::default(), "", None).unwrap();
        assert!(renderer.render("{{#if metadata.title}}open", &ctx).is_err());
    }

    #[test]
    fn test_escaped_and_raw_interpolation() {
        let renderer = LayoutRenderer::default();
        let ctx = TemplateContext::new(&meta("title: A & B"), "<p>x</p>", None).unwrap();
        let html = renderer
            .render("<h1>{{metadata.title}}</h1>{{{content}}}", &ctx)
            .unwrap();
        assert_eq!(html, "<h1>A &amp; B</h1><p>x</p>");
    }

    #[test]
    fn test_jinja_syntax() {
        let renderer =
            LayoutRenderer::with_syntax(TemplateSyntax::Jinja, ResourceResolver::passthrough());
        let ctx = TemplateContext::new(&meta("layout: intro"), "<p>c</p>", None).unwrap();
        let html = renderer
            .render(r#"{% if eq(metadata.layout, "intro") %}{{ content }}{% endif %}"#, &ctx)
            .unwrap();
        assert_eq!(html, "<p>c</p>");
    }
}
