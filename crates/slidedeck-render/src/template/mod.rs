//! Custom layout templates.
//!
//! Layouts are Handlebars templates (`.hbs`) fetched from the host. They
//! receive the slide metadata and the serialized body, and their output
//! replaces the render tree as the slide's content. Decks can switch to
//! Jinja syntax through [`TemplateSyntax`].
//!
//! Two post-processing passes run on every layout result: `<style>` blocks
//! without a `type` are re-marked for the host's utility-CSS engine, and
//! relative `<img src>` values are resolved against the base URL.

mod engine;
mod layout;

pub use engine::{
    register_helpers, HandlebarsEngine, MiniJinjaEngine, TemplateEngine, TemplateSyntax,
};
pub use layout::{mark_utility_styles, LayoutRenderer, TemplateContext, UTILITY_STYLE_TYPE};
