//! Text-level preprocessing of slide bodies.
//!
//! The two-column layout is expressed in the source with a single marker line
//! separating the left and right halves. It is rewritten before parsing into
//! raw-HTML containers, with blank lines around each half so the markdown
//! parser treats both halves as ordinary markdown nested in HTML blocks.

/// Default marker separating the left and right column.
pub const COLUMN_MARKER: &str = "::right::";

/// Rewrites a body containing exactly one column marker into two columns.
///
/// Bodies without a marker, or with more than one, are returned unchanged.
///
/// ```rust
/// use slidedeck_render::preprocess::{two_column, COLUMN_MARKER};
///
/// let out = two_column("# Left\n\n::right::\n\n# Right", COLUMN_MARKER);
/// assert!(out.contains(r#"<div class="slide__left">"#));
/// assert!(out.contains(r#"<div class="slide__right">"#));
/// assert!(!out.contains(COLUMN_MARKER));
/// ```
pub fn two_column<'a>(body: &'a str, marker: &str) -> std::borrow::Cow<'a, str> {
    if marker.is_empty() || !body.contains(marker) {
        return body.into();
    }

    let segments: Vec<&str> = body.split(marker).collect();
    let [left, right] = segments.as_slice() else {
        tracing::debug!(
            segments = segments.len(),
            "column marker repeated, leaving body unchanged"
        );
        return body.into();
    };

    format!(
        "<div class=\"slide__columns\">\n<div class=\"slide__left\">\n\n{}\n\n</div>\n<div class=\"slide__right\">\n\n{}\n\n</div>\n</div>\n",
        left.trim(),
        right.trim()
    )
    .into()
}
