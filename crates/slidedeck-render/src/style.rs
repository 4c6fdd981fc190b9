//! Presentation styles injected around a rendered slide.

use crate::host::HostChannel;
use crate::markdown::escape_attr;
use crate::resolve::ResourceResolver;

/// Styles attached to a slide independently of how its body was rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectedStyles {
    /// Stylesheet URL of the custom theme.
    pub custom_theme: Option<String>,
    /// Inline style showing the background image.
    pub background: Option<String>,
    /// Declaration of the scale variable, e.g. `--slide-scale: 2;`.
    pub scale: String,
}

impl InjectedStyles {
    /// `<link>` element for the custom theme, if any.
    pub fn theme_link(&self) -> Option<String> {
        self.custom_theme.as_deref().map(|href| {
            let mut out = String::from("<link href=\"");
            escape_attr(href, &mut out);
            out.push_str("\" rel=\"stylesheet\" />");
            out
        })
    }

    /// Inline style for the slide wrapper: scale variable, then background.
    pub fn inline_style(&self) -> String {
        match &self.background {
            Some(background) if self.scale.is_empty() => background.clone(),
            Some(background) => format!("{} {}", self.scale, background),
            None => self.scale.clone(),
        }
    }
}

/// Inline style rendering `url` as a full-bleed background with light text.
pub fn background_style(url: &str) -> String {
    format!(
        "color: white; background-image: url('{}'); background-repeat: no-repeat; \
         background-size: cover; background-position: center center;",
        url.replace('\'', "%27")
    )
}

/// Background style for a metadata `image` value.
pub fn resolve_background(image: Option<&str>, resolver: &ResourceResolver) -> Option<String> {
    image
        .and_then(|image| resolver.resolve(image))
        .map(|url| background_style(&url))
}

/// Resolves a custom theme reference to a stylesheet URL.
///
/// `https://` URLs are used as is; anything else is a workspace path that the
/// host converts. A failed conversion omits the theme.
pub async fn resolve_custom_theme<H>(host: &H, theme: &str) -> Option<String>
where
    H: HostChannel + ?Sized,
{
    let theme = theme.trim();
    if theme.is_empty() {
        return None;
    }
    if theme.starts_with("https://") {
        return Some(theme.to_string());
    }
    match host.resolve_uri(theme).await {
        Ok(uri) if !uri.is_empty() => Some(uri),
        Ok(_) => {
            tracing::warn!(theme, "host resolved custom theme to an empty URI");
            None
        }
        Err(err) => {
            tracing::warn!(theme, error = %err, "failed to resolve custom theme");
            None
        }
    }
}
