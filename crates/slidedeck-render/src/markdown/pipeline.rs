//! The markdown transform pipeline.

use pulldown_cmark::{Event, Options, Parser};

use super::convert::{build_tree, rewrite_diagrams};
use super::tree::{Node, RenderTree};
use crate::config::RenderConfig;
use crate::error::RenderError;

/// A transformation applied to the render tree after conversion.
///
/// Stages run in the order they are passed to
/// [`MarkdownPipeline::transform`]. A failing stage aborts the whole
/// transform.
pub trait TreeStage: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    fn apply(&self, tree: &mut RenderTree) -> Result<(), RenderError>;
}

/// The renderable result of a transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    tree: RenderTree,
}

impl RenderOutput {
    /// Top-level renderable nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.tree.children
    }

    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    pub fn into_tree(self) -> RenderTree {
        self.tree
    }

    /// Serializes the output to static markup.
    pub fn to_html(&self) -> String {
        self.tree.to_html()
    }
}

/// Converts a slide body into a render tree.
///
/// Stage order is fixed: parse, diagram rewriting, tree conversion, then the
/// caller's stages. Identical input always produces identical output.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::{MarkdownPipeline, RenderConfig};
///
/// let pipeline = MarkdownPipeline::new(&RenderConfig::default());
/// let output = pipeline
///     .transform("# Hello", &[], |err| panic!("{err}"))
///     .unwrap();
/// assert_eq!(output.to_html(), "<h1>Hello</h1>");
/// ```
#[derive(Debug, Clone)]
pub struct MarkdownPipeline {
    options: Options,
    diagram_languages: Vec<String>,
}

impl MarkdownPipeline {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES,
            diagram_languages: config.diagram_languages.clone(),
        }
    }

    fn is_diagram(&self, lang: &str) -> bool {
        self.diagram_languages
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(lang))
    }

    /// Runs the pipeline, propagating the first stage failure.
    pub fn try_transform(
        &self,
        body: &str,
        stages: &[&dyn TreeStage],
    ) -> Result<RenderOutput, RenderError> {
        let events: Vec<Event<'_>> = Parser::new_ext(body, self.options).collect();
        let events = rewrite_diagrams(events, |lang| self.is_diagram(lang));
        let mut tree = build_tree(events);

        for stage in stages {
            stage.apply(&mut tree).map_err(|err| match err {
                err @ RenderError::StageError { .. } => err,
                other => RenderError::stage(stage.name(), other.to_string()),
            })?;
        }

        Ok(RenderOutput { tree })
    }

    /// Runs the pipeline. On failure the error goes to `on_error` and the
    /// result is `None`: the body is not renderable yet.
    pub fn transform(
        &self,
        body: &str,
        stages: &[&dyn TreeStage],
        on_error: impl FnOnce(&RenderError),
    ) -> Option<RenderOutput> {
        match self.try_transform(body, stages) {
            Ok(output) => Some(output),
            Err(err) => {
                tracing::debug!(error = %err, "markdown pipeline failed");
                on_error(&err);
                None
            }
        }
    }
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}
