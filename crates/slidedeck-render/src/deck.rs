//! Splitting a presentation document into slides.
//!
//! A deck is one markdown document. The document may open with a frontmatter
//! block holding deck-wide defaults. Slides are separated by `---` lines:
//!
//! ```text
//! ---
//! theme: monomi
//! transition: fade
//! ---
//! # Welcome
//!
//! ---
//! layout: two-columns
//! ---
//! Left ::right:: Right
//!
//! --- layout: intro title: "The end" ---
//! # Thanks
//! ```
//!
//! A `---` line directly followed by a `key:` line opens a per-slide
//! frontmatter block. A delimiter carrying props on the same line
//! (`--- layout: intro ---`) is decoded with [`parse_inline_props`].
//! Separators inside fenced code blocks are ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::metadata::{extract, metadata_block, parse_inline_props, SlideMetadata, DEFAULT_LAYOUT};

static FRONTMATTER_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+\s*:").expect("valid frontmatter key regex"));
static INLINE_DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---\s+(.+?)\s*---$").expect("valid inline delimiter regex"));

/// One slide of a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// Position in the deck, counting only kept slides.
    pub index: usize,
    /// Body without frontmatter, trimmed.
    pub content: String,
    /// Body without frontmatter, untrimmed.
    pub raw_content: String,
    /// Slide metadata with deck defaults applied.
    pub metadata: SlideMetadata,
}

struct Block {
    text: String,
    inline: Option<SlideMetadata>,
}

struct Fence {
    marker: String,
}

fn fence_opening(trimmed: &str) -> Option<Fence> {
    let ticks = trimmed.chars().take_while(|c| *c == '`').count();
    (ticks >= 3).then(|| Fence {
        marker: "`".repeat(ticks),
    })
}

fn flush(
    blocks: &mut Vec<Block>,
    buffer: &mut Vec<&str>,
    inline: &mut Option<SlideMetadata>,
    force: bool,
) {
    if force || !buffer.is_empty() || inline.is_some() {
        blocks.push(Block {
            text: buffer.join("\n"),
            inline: inline.take(),
        });
    }
    buffer.clear();
}

fn split_blocks(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut blocks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut inline: Option<SlideMetadata> = None;
    let mut fence: Option<Fence> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if let Some(open) = &fence {
            buffer.push(line);
            if trimmed.starts_with(&open.marker) {
                fence = None;
            }
            i += 1;
            continue;
        }

        if let Some(opening) = fence_opening(trimmed) {
            fence = Some(opening);
            buffer.push(line);
            i += 1;
            continue;
        }

        if trimmed == "---" {
            let opens_frontmatter = lines
                .get(i + 1)
                .is_some_and(|next| FRONTMATTER_KEY_RE.is_match(next));
            if opens_frontmatter {
                flush(&mut blocks, &mut buffer, &mut inline, false);
                buffer.push(line);
                i += 1;
                while i < lines.len() {
                    buffer.push(lines[i]);
                    if lines[i].trim() == "---" {
                        break;
                    }
                    i += 1;
                }
            } else {
                flush(&mut blocks, &mut buffer, &mut inline, true);
            }
            i += 1;
            continue;
        }

        if let Some(caps) = INLINE_DELIMITER_RE.captures(trimmed) {
            flush(&mut blocks, &mut buffer, &mut inline, false);
            inline = Some(parse_inline_props(&caps[1]));
            i += 1;
            continue;
        }

        buffer.push(line);
        i += 1;
    }
    flush(&mut blocks, &mut buffer, &mut inline, false);

    blocks
}

/// Splits a deck document into slides and applies deck-level defaults.
///
/// The first slide takes every document key. All slides get document
/// `theme`, `customTheme` and `customLayout`, inherit `transition`, `header`,
/// `footer` and unrecognized keys unless they set their own, and default to
/// the `default` layout. A document holding only frontmatter yields one empty
/// slide.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::deck::parse_deck;
///
/// let slides = parse_deck("---\ntheme: monomi\n---\n# One\n\n---\n\n# Two\n");
/// assert_eq!(slides.len(), 2);
/// assert_eq!(slides[1].content, "# Two");
/// assert_eq!(slides[1].metadata.theme.as_deref(), Some("monomi"));
/// assert_eq!(slides[1].metadata.layout.as_deref(), Some("default"));
/// ```
pub fn parse_deck(markdown: &str) -> Vec<Slide> {
    if markdown.trim().is_empty() {
        return Vec::new();
    }

    let document = extract(markdown);
    let doc = document.metadata;

    let mut slides: Vec<Slide> = Vec::new();
    for block in split_blocks(document.body) {
        let text = block.text.trim_start();
        let has_frontmatter = metadata_block(text).is_some();
        let extracted = extract(text);

        let mut metadata = block.inline.unwrap_or_default();
        metadata.overlay(&extracted.metadata);

        if extracted.body.trim().is_empty() && !has_frontmatter && metadata.is_empty() {
            continue;
        }

        slides.push(Slide {
            index: slides.len(),
            content: extracted.body.trim().to_string(),
            raw_content: extracted.body.to_string(),
            metadata,
        });
    }

    if slides.is_empty() && !doc.is_empty() {
        slides.push(Slide {
            index: 0,
            content: String::new(),
            raw_content: String::new(),
            metadata: SlideMetadata::default(),
        });
    }

    for slide in &mut slides {
        if slide.index == 0 {
            slide.metadata.overlay(&doc);
        }
        if slide.metadata.layout.is_none() {
            slide.metadata.layout = Some(DEFAULT_LAYOUT.to_string());
        }
        slide.metadata.merge_document_defaults(&doc);
    }

    tracing::debug!(slides = slides.len(), "parsed deck");
    slides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert!(parse_deck("").is_empty());
        assert!(parse_deck("   \n   \n   ").is_empty());
    }

    #[test]
    fn test_single_slide_with_document_frontmatter() {
        for markdown in [
            "---\ntheme: monomi\n---\n\n# The end\n\n",
            "---\ntheme: monomi\n---\n\n# The end",
            "---\ntheme: monomi\n---\n# The end\n",
        ] {
            let slides = parse_deck(markdown);
            assert_eq!(slides.len(), 1, "{markdown:?}");
            assert_eq!(slides[0].content, "# The end");
            assert_eq!(slides[0].metadata.theme.as_deref(), Some("monomi"));
        }
    }

    #[test]
    fn test_frontmatter_only_document() {
        for markdown in ["---\ntheme: monomi\n---\n", "---\ntheme: monomi\n---"] {
            let slides = parse_deck(markdown);
            assert_eq!(slides.len(), 1);
            assert_eq!(slides[0].content, "");
            assert_eq!(slides[0].metadata.theme.as_deref(), Some("monomi"));
        }
    }

    #[test]
    fn test_two_slides() {
        let slides = parse_deck("---\ntheme: monomi\n---\n\n# First slide\n\n---\n\n# Second slide\n\n");
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].content, "# First slide");
        assert_eq!(slides[1].content, "# Second slide");
        assert_eq!(slides[1].index, 1);
    }

    #[test]
    fn test_per_slide_frontmatter() {
        let slides = parse_deck(
            "# One\n\n---\nlayout: intro\ntransition: zoom\n---\n# Two\n\n---\n\n# Three",
        );
        assert_eq!(slides.len(), 3);
        assert_eq!(slides[1].content, "# Two");
        assert_eq!(slides[1].metadata.layout.as_deref(), Some("intro"));
        assert_eq!(slides[1].metadata.transition.as_deref(), Some("zoom"));
        assert_eq!(slides[2].metadata.layout.as_deref(), Some("default"));
    }

    #[test]
    fn test_separator_inside_code_fence_is_ignored() {
        let slides = parse_deck("```yaml\n---\nkey: value\n---\n```\n\n---\n\nnext");
        assert_eq!(slides.len(), 2);
        assert!(slides[0].content.contains("key: value"));
        assert_eq!(slides[1].content, "next");
    }

    #[test]
    fn test_inline_delimiter_props() {
        let slides = parse_deck("# One\n--- layout: intro title: \"Big end\" ---\n# Two");
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].metadata.layout.as_deref(), Some("intro"));
        assert_eq!(slides[1].metadata.title.as_deref(), Some("Big end"));
        assert_eq!(slides[1].content, "# Two");
    }

    #[test]
    fn test_document_inheritance() {
        let slides = parse_deck(
            "---\ntheme: dark\ncustomLayout: l.html\ntransition: fade\nlayout: cover\nimage: bg.png\nspeaker: Jane\n---\n# One\n\n---\ntheme: light\ntransition: none\nspeaker: Joe\n---\n# Two",
        );
        assert_eq!(slides.len(), 2);

        let first = &slides[0].metadata;
        assert_eq!(first.layout.as_deref(), Some("cover"));
        assert_eq!(first.image.as_deref(), Some("bg.png"));

        let second = &slides[1].metadata;
        assert_eq!(second.theme.as_deref(), Some("dark"));
        assert_eq!(second.custom_layout.as_deref(), Some("l.html"));
        assert_eq!(second.transition.as_deref(), Some("none"));
        assert_eq!(second.layout.as_deref(), Some("default"));
        assert_eq!(second.image, None);
        assert_eq!(
            second.get_extra("speaker"),
            Some(&serde_yaml::Value::String("Joe".into()))
        );
    }

    #[test]
    fn test_crlf_document() {
        let slides = parse_deck("# One\r\n\r\n---\r\n\r\n# Two\r\n");
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].content, "# One");
        assert_eq!(slides[1].content, "# Two");
    }
}
