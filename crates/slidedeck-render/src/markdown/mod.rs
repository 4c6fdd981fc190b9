//! Markdown to render tree conversion.
//!
//! [`MarkdownPipeline`] parses a slide body with pulldown-cmark, turns diagram
//! code blocks into raw passthrough markup, converts the events into a
//! [`RenderTree`] and runs caller-supplied [`TreeStage`]s over it.
//!
//! Raw HTML in the body (block or inline) is kept verbatim, which is what lets
//! the two-column wrapper divs survive the conversion.

mod convert;
mod pipeline;
mod stages;
mod tree;

pub use pipeline::{MarkdownPipeline, RenderOutput, TreeStage};
pub use stages::{HighlightStage, ImageStage};
pub use tree::{escape_attr, escape_text, Element, Node, RenderTree};
