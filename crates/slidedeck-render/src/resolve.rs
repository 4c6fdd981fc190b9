//! Resource URL resolution.
//!
//! Slides reference images and backgrounds with paths relative to the
//! document. The hosting surface serves those files from its own root, so every
//! relative path has to be joined to that root before it can be displayed.
//!
//! [`ResourceResolver`] is deliberately idempotent: resolving a value that was
//! already resolved returns it unchanged. This matters because the same source
//! can pass through several stages (image stage, template post-processing,
//! background styling).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme regex"));
static IMG_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid img regex")
});

/// Returns `true` for scheme-qualified (`https:`, `data:`, ...) or
/// protocol-relative (`//cdn.example.com/...`) sources.
pub fn is_absolute_url(src: &str) -> bool {
    src.starts_with("//") || SCHEME_RE.is_match(src)
}

/// Joins relative resource paths to the hosting surface's base URL.
///
/// # Example
///
/// ```rust
/// use slidedeck_render::ResourceResolver;
///
/// let resolver = ResourceResolver::new("https://host.local/ws");
/// assert_eq!(
///     resolver.resolve("./img/logo.png").as_deref(),
///     Some("https://host.local/ws/img/logo.png")
/// );
/// assert_eq!(
///     resolver.resolve("https://example.com/a.png").as_deref(),
///     Some("https://example.com/a.png")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceResolver {
    base: Option<String>,
}

impl ResourceResolver {
    /// Creates a resolver for the given base URL.
    ///
    /// An empty base behaves like [`ResourceResolver::passthrough`].
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/').to_string();
        Self {
            base: if base.is_empty() { None } else { Some(base) },
        }
    }

    /// Creates a resolver without a base; relative sources pass through.
    pub fn passthrough() -> Self {
        Self { base: None }
    }

    /// The base URL without trailing slash, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Resolves a source taken from markdown image syntax or metadata.
    ///
    /// Returns `None` for an empty source.
    pub fn resolve(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }

        if is_absolute_url(src) {
            return Some(src.to_string());
        }

        let Some(base) = self.base.as_deref() else {
            return Some(src.to_string());
        };

        if src.starts_with(base) {
            return Some(src.to_string());
        }

        let relative = src.strip_prefix("./").unwrap_or(src).trim_start_matches('/');
        Some(format!("{}/{}", base, relative))
    }
}

/// Resolves relative `<img src>` values in raw markup.
///
/// Used for markup the tree never sees as image elements: HTML embedded in
/// the markdown body and the output of custom layouts. Borrows when there is
/// no base URL.
pub fn resolve_image_sources<'a>(markup: &'a str, resolver: &ResourceResolver) -> Cow<'a, str> {
    if resolver.base().is_none() {
        return Cow::Borrowed(markup);
    }
    IMG_SRC_RE.replace_all(markup, |caps: &Captures| {
        let (src, quote) = match (caps.get(2), caps.get(3)) {
            (Some(m), _) => (m.as_str(), '"'),
            (None, Some(m)) => (m.as_str(), '\''),
            (None, None) => ("", '"'),
        };
        match resolver.resolve(src) {
            Some(resolved) => format!("{}{quote}{}{quote}", &caps[1], resolved),
            None => caps[0].to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_unchanged() {
        let resolver = ResourceResolver::new("https://host.local/root");
        for src in [
            "https://example.com/a.png",
            "http://example.com/a.png",
            "data:image/png;base64,AAAA",
            "vscode-webview://abc/file.png",
            "//cdn.example.com/a.png",
        ] {
            assert_eq!(resolver.resolve(src).as_deref(), Some(src));
        }
    }

    #[test]
    fn test_relative_path_joined_once() {
        let resolver = ResourceResolver::new("https://host.local/root/");
        let first = resolver.resolve("images/a.png").unwrap();
        assert_eq!(first, "https://host.local/root/images/a.png");

        let second = resolver.resolve(&first).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_leading_dot_and_slash_stripped() {
        let resolver = ResourceResolver::new("https://host.local");
        assert_eq!(
            resolver.resolve("./a.png").as_deref(),
            Some("https://host.local/a.png")
        );
        assert_eq!(
            resolver.resolve("/a.png").as_deref(),
            Some("https://host.local/a.png")
        );
    }

    #[test]
    fn test_empty_source_is_none() {
        let resolver = ResourceResolver::new("https://host.local");
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("   "), None);
    }

    #[test]
    fn test_resolve_image_sources() {
        let resolver = ResourceResolver::new("https://host.local/ws");
        let out = resolve_image_sources(
            r#"<img src="./a.png"><img alt='x' src='https://cdn/b.png'><img src="">"#,
            &resolver,
        );
        assert_eq!(
            out,
            r#"<img src="https://host.local/ws/a.png"><img alt='x' src='https://cdn/b.png'><img src="">"#
        );
    }

    #[test]
    fn test_resolve_image_sources_keeps_other_attributes() {
        let resolver = ResourceResolver::new("https://host.local/ws");
        let out = resolve_image_sources(r#"<IMG width="200" SRC="logo.png" alt="l">"#, &resolver);
        assert_eq!(
            out,
            r#"<IMG width="200" SRC="https://host.local/ws/logo.png" alt="l">"#
        );
    }

    #[test]
    fn test_resolve_image_sources_without_base_borrows() {
        let out = resolve_image_sources(r#"<img src="a.png">"#, &ResourceResolver::passthrough());
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_passthrough_without_base() {
        let resolver = ResourceResolver::new("");
        assert_eq!(resolver.base(), None);
        assert_eq!(resolver.resolve("a.png").as_deref(), Some("a.png"));
    }
}
