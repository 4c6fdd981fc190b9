//! Tree stages shipped with the crate.

use std::borrow::Cow;

use syntect::html::highlighted_html_for_string;

use super::pipeline::TreeStage;
use super::tree::{Node, RenderTree};
use crate::error::RenderError;
use crate::resolve::{resolve_image_sources, ResourceResolver};
use crate::theme::{HighlightTheme, SYNTAX_SET};

/// Highlights `<pre><code class="language-*">` blocks with syntect.
///
/// Blocks without a language are left alone. Unknown languages are rendered
/// as plain text in the theme's colors.
#[derive(Debug, Clone)]
pub struct HighlightStage {
    theme: HighlightTheme,
}

impl HighlightStage {
    pub fn new(theme: HighlightTheme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &HighlightTheme {
        &self.theme
    }
}

fn code_block(node: &Node) -> Option<(String, String)> {
    let Node::Element(pre) = node else {
        return None;
    };
    if pre.tag != "pre" {
        return None;
    }
    let Some(Node::Element(code)) = pre.children.first() else {
        return None;
    };
    if code.tag != "code" {
        return None;
    }
    let lang = code
        .attr("class")?
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))?;
    Some((lang.to_string(), code.text_content()))
}

impl TreeStage for HighlightStage {
    fn name(&self) -> &str {
        "highlight"
    }

    fn apply(&self, tree: &mut RenderTree) -> Result<(), RenderError> {
        tree.try_walk_mut(|node| {
            let Some((lang, source)) = code_block(node) else {
                return Ok(());
            };
            let syntax = SYNTAX_SET
                .find_syntax_by_token(&lang)
                .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
            let html = highlighted_html_for_string(&source, &SYNTAX_SET, syntax, self.theme.theme())?;
            *node = Node::Raw(html);
            Ok(())
        })
    }
}

/// Resolves image sources and drops images without one.
#[derive(Debug, Clone, Default)]
pub struct ImageStage {
    resolver: ResourceResolver,
}

impl ImageStage {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self { resolver }
    }
}

impl TreeStage for ImageStage {
    fn name(&self) -> &str {
        "images"
    }

    fn apply(&self, tree: &mut RenderTree) -> Result<(), RenderError> {
        tree.retain(|node| match node {
            Node::Element(el) if el.tag == "img" => el
                .attr("src")
                .is_some_and(|src| !src.trim().is_empty()),
            _ => true,
        });
        tree.try_walk_mut(|node| {
            match node {
                Node::Element(el) if el.tag == "img" => {
                    if let Some(resolved) =
                        el.attr("src").and_then(|src| self.resolver.resolve(src))
                    {
                        el.set_attr("src", resolved);
                    }
                }
                // Embedded HTML
                Node::Raw(raw) => {
                    let updated = match resolve_image_sources(raw, &self.resolver) {
                        Cow::Owned(updated) => Some(updated),
                        Cow::Borrowed(_) => None,
                    };
                    if let Some(updated) = updated {
                        *raw = updated;
                    }
                }
                _ => {}
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownPipeline;

    fn render(body: &str, stages: &[&dyn TreeStage]) -> String {
        MarkdownPipeline::default()
            .try_transform(body, stages)
            .unwrap()
            .to_html()
    }

    #[test]
    fn test_highlight_replaces_labelled_blocks() {
        let stage = HighlightStage::new(HighlightTheme::fallback(None));
        let html = render("```rust\nlet x = 1;\n```", &[&stage]);
        assert!(html.starts_with("<pre style=\""));
        assert!(html.contains("<span"));
        assert!(!html.contains("language-rust"));
    }

    #[test]
    fn test_highlight_leaves_unlabelled_blocks() {
        let stage = HighlightStage::new(HighlightTheme::fallback(None));
        let html = render("```\nplain\n```", &[&stage]);
        assert_eq!(html, "<pre><code>plain\n</code></pre>");
    }

    #[test]
    fn test_highlight_unknown_language_as_plain_text() {
        let stage = HighlightStage::new(HighlightTheme::fallback(None));
        let html = render("```nosuchlang\na < b\n```", &[&stage]);
        assert!(html.starts_with("<pre style=\""));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_images_resolved_against_base() {
        let stage = ImageStage::new(ResourceResolver::new("https://host.local/ws"));
        let html = render("![logo](./img/logo.png) ![abs](https://x.dev/a.png)", &[&stage]);
        assert!(html.contains("src=\"https://host.local/ws/img/logo.png\""));
        assert!(html.contains("src=\"https://x.dev/a.png\""));
    }

    #[test]
    fn test_images_without_source_are_dropped() {
        let stage = ImageStage::new(ResourceResolver::new("https://host.local"));
        let html = render("before ![empty]() after", &[&stage]);
        assert!(!html.contains("<img"));
        assert!(html.contains("before"));
        assert!(html.contains("after"));
    }

    #[test]
    fn test_embedded_html_images_are_resolved() {
        let stage = ImageStage::new(ResourceResolver::new("https://host.local/ws"));
        let html = render(
            "<img src=\"./logo.png\" width=\"200\">\n\n![md](./logo.png)",
            &[&stage],
        );
        assert!(html.contains("<img src=\"https://host.local/ws/logo.png\" width=\"200\">"));
        assert_eq!(html.matches("https://host.local/ws/logo.png").count(), 2);
        assert!(!html.contains("\"./logo.png\""));
    }

    #[test]
    fn test_resolving_twice_does_not_double_prefix() {
        let stage = ImageStage::new(ResourceResolver::new("https://host.local"));
        let html = render("![a](a.png)", &[&stage, &stage]);
        assert!(html.contains("src=\"https://host.local/a.png\""));
    }
}
