//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait which lets the layout
//! renderer work with different template backends. Layout files are
//! Handlebars (`.hbs`) by default, rendered by [`HandlebarsEngine`];
//! [`MiniJinjaEngine`] serves decks that opt into Jinja syntax through
//! [`TemplateSyntax`].

use handlebars::{handlebars_helper, Handlebars};
use minijinja::{AutoEscape, Environment, Value};
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// A template engine that can render templates with data.
///
/// Template engines handle:
/// - Template compilation and caching
/// - Variable substitution (`metadata.title`, `content`)
/// - Template logic (loops, conditionals)
/// - The helper set layouts rely on (`eq`)
pub trait TemplateEngine: Send + Sync {
    /// Compiles and renders a template string in one step.
    fn render_template(&self, template: &str, data: &serde_json::Value)
        -> Result<String, RenderError>;

    /// Compiles a template and caches it under `name`, replacing any previous
    /// template with that name.
    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError>;

    /// Renders a previously added template.
    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError>;

    /// Checks if a template with the given name exists.
    fn has_template(&self, name: &str) -> bool;
}

/// Syntax of custom layout files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSyntax {
    /// `{{metadata.title}}`, `{{{content}}}`, `{{#if (eq a b)}}`.
    #[default]
    Handlebars,
    /// `{{ metadata.title }}`, `{{ content }}`, `{% if eq(a, b) %}`.
    Jinja,
}

impl TemplateSyntax {
    /// Creates an engine for this syntax.
    pub fn engine(self) -> Box<dyn TemplateEngine> {
        match self {
            TemplateSyntax::Handlebars => Box::new(HandlebarsEngine::new()),
            TemplateSyntax::Jinja => Box::new(MiniJinjaEngine::new()),
        }
    }
}

handlebars_helper!(hbs_eq: |a: Json, b: Json| a == b);

/// Handlebars-based template engine.
///
/// `{{ }}` output is HTML-escaped, `{{{ }}}` is not: layouts interpolate the
/// rendered body as `{{{content}}}`. Missing variables render as empty
/// strings.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::template::{HandlebarsEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = HandlebarsEngine::new();
/// let output = engine
///     .render_template(
///         r#"{{#if (eq metadata.layout "intro")}}<h1>{{metadata.title}}</h1>{{/if}}{{{content}}}"#,
///         &json!({ "metadata": { "layout": "intro", "title": "Hi" }, "content": "<p>x</p>" }),
///     )
///     .unwrap();
/// assert_eq!(output, "<h1>Hi</h1><p>x</p>");
/// ```
pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsEngine {
    /// Creates a new engine with the `eq` helper registered.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("eq", Box::new(hbs_eq));
        Self { registry }
    }

    /// Returns a mutable reference to the underlying registry, for
    /// registering further helpers.
    pub fn registry_mut(&mut self) -> &mut Handlebars<'static> {
        &mut self.registry
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlebarsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlebarsEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render_template(
        &self,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        Ok(self.registry.render_template(template, data)?)
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.registry.register_template_string(name, source)?;
        Ok(())
    }

    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError> {
        if !self.registry.has_template(name) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }
        Ok(self.registry.render(name, data)?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }
}

/// MiniJinja-based template engine.
///
/// Auto-escaping is off: layouts interpolate `content`, which is already
/// markup. Undefined variables render as empty strings.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::template::{MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = MiniJinjaEngine::new();
/// let output = engine
///     .render_template(
///         r#"{% if eq(metadata.layout, "intro") %}<h1>{{ metadata.title }}</h1>{% endif %}{{ content }}"#,
///         &json!({ "metadata": { "layout": "intro", "title": "Hi" }, "content": "<p>x</p>" }),
///     )
///     .unwrap();
/// assert_eq!(output, "<h1>Hi</h1><p>x</p>");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Creates a new engine with the layout helpers registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        register_helpers(&mut env);
        Self { env }
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment,
    /// for registering further filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_template(
        &self,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let value = Value::from_serialize(data);
        Ok(self.env.render_str(template, value)?)
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError> {
        let tmpl = self.env.get_template(name)?;
        let value = Value::from_serialize(data);
        Ok(tmpl.render(value)?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

/// Registers the layout helpers with a MiniJinja environment.
///
/// This is called automatically by [`MiniJinjaEngine::new`].
///
/// - `eq(a, b)`: equality test for conditional branches. Also available as
///   a filter, `{{ metadata.layout | eq("intro") }}`.
pub fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("eq", |a: Value, b: Value| -> bool { a == b });
    env.add_filter("eq", |a: Value, b: Value| -> bool { a == b });
}
