//! Frontmatter recognition and decoding.

use super::SlideMetadata;

const DELIMITER: &str = "---";

/// A document split into its decoded metadata and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<'a> {
    pub metadata: SlideMetadata,
    pub body: &'a str,
}

/// Location of a frontmatter block inside a document.
struct Block {
    /// Byte range of the block text (between the delimiter lines).
    content: std::ops::Range<usize>,
    /// Byte offset where the body starts.
    body_start: usize,
}

/// Splits the document into lines, keeping the byte offset where each line
/// starts and where the next one begins.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str, usize)> + '_ {
    let mut offset = 0;
    std::iter::from_fn(move || {
        if offset >= text.len() {
            return None;
        }
        let start = offset;
        let rest = &text[start..];
        let (line, next) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], start + idx + 1),
            None => (rest, text.len()),
        };
        offset = next;
        Some((start, line.strip_suffix('\r').unwrap_or(line), next))
    })
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches([' ', '\t']) == DELIMITER
}

fn locate(document: &str) -> Option<Block> {
    let mut lines = lines_with_offsets(document);

    let (_, first, content_start) = lines.next()?;
    if !is_delimiter(first) {
        return None;
    }

    for (start, line, next) in lines {
        if is_delimiter(line) {
            let content = &document[content_start..start];
            let content = content.strip_suffix('\n').unwrap_or(content);
            let content = content.strip_suffix('\r').unwrap_or(content);
            return Some(Block {
                content: content_start..content_start + content.len(),
                body_start: next,
            });
        }
    }

    None
}

/// Returns the raw, undecoded frontmatter block text, if the document starts
/// with one.
///
/// This is cheap and meant for change detection.
pub fn metadata_block(document: &str) -> Option<&str> {
    locate(document).map(|block| &document[block.content])
}

/// Returns the document body with any leading frontmatter block removed.
pub fn strip_metadata(document: &str) -> &str {
    match locate(document) {
        Some(block) => &document[block.body_start..],
        None => document,
    }
}

/// Splits a document into decoded metadata and body.
///
/// A block is recognized only when the very first line is `---` and a later
/// line is `---` again (trailing spaces, tabs and CRLF line endings are
/// tolerated). The body is exactly the text following the closing line.
///
/// A block that fails to decode yields empty metadata; the failure is logged
/// and the body is still split off.
///
/// ```rust
/// use slidedeck_render::metadata::extract;
///
/// let doc = "---\ntheme: dark\n---\n# Hello";
/// let extracted = extract(doc);
/// assert_eq!(extracted.metadata.theme.as_deref(), Some("dark"));
/// assert_eq!(extracted.body, "# Hello");
/// ```
pub fn extract(document: &str) -> Extracted<'_> {
    let Some(block) = locate(document) else {
        return Extracted {
            metadata: SlideMetadata::default(),
            body: document,
        };
    };

    let text = &document[block.content.clone()];
    let metadata = match SlideMetadata::from_yaml(text) {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode frontmatter, using empty metadata");
            SlideMetadata::default()
        }
    };

    Extracted {
        metadata,
        body: &document[block.body_start..],
    }
}
