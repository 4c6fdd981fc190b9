//! The slide view: one visible slide, rendered end to end.
//!
//! [`SlideView::render`] runs the whole flow for a slide document:
//!
//! 1. Extract metadata. The raw frontmatter text is compared first; only if it
//!    changed are the resolution fields compared, and a change there starts a
//!    new *generation*.
//! 2. Once per generation, resolve the custom theme (through the host) and the
//!    background image, and fetch the custom layout source.
//! 3. Preprocess two-column bodies and run the markdown pipeline with
//!    highlighting and image resolution.
//! 4. With a custom layout, render the serialized tree through it. Any layout
//!    failure falls back to the plain tree.
//! 5. Discard the result if a newer generation started while awaiting the
//!    host.
//! 6. Signal the host that the slide is ready, once per generation, and let
//!    the scaler know the content settled.
//!
//! The view state sits behind a `std::sync::Mutex` that is never held across
//! an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::host::HostChannel;
use crate::markdown::{
    escape_attr, HighlightStage, ImageStage, MarkdownPipeline, RenderTree, TreeStage,
};
use crate::metadata::{extract, metadata_block, ResolutionKey, SlideMetadata};
use crate::preprocess::two_column;
use crate::resolve::ResourceResolver;
use crate::scale::{ScaleCalculator, Scaler};
use crate::style::{resolve_background, resolve_custom_theme, InjectedStyles};
use crate::template::{LayoutRenderer, TemplateContext};
use crate::theme::HighlightTheme;

/// Wrapper class of a slide rendered from its markdown tree.
pub const INNER_CLASS: &str = "slide__content__inner";
/// Wrapper class of a slide rendered through a custom layout.
pub const CUSTOM_CLASS: &str = "slide__content__custom";

type ErrorHandler = Box<dyn Fn(&RenderError) + Send + Sync>;

/// The content of a rendered slide.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBody {
    /// Plain render: the markdown tree.
    Tree(RenderTree),
    /// Custom layout output, injected as markup.
    Markup(String),
}

/// A fully rendered slide.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub metadata: SlideMetadata,
    pub body: SlideBody,
    pub styles: InjectedStyles,
    /// Metadata generation this slide was rendered for.
    pub generation: u64,
}

impl RenderedSlide {
    pub fn is_templated(&self) -> bool {
        matches!(self.body, SlideBody::Markup(_))
    }

    /// Serializes the slide: theme link, then the wrapper carrying the scale
    /// variable and background.
    pub fn to_html(&self) -> String {
        let (class, inner) = match &self.body {
            SlideBody::Tree(tree) => (INNER_CLASS, tree.to_html()),
            SlideBody::Markup(markup) => (CUSTOM_CLASS, markup.clone()),
        };

        let mut out = String::new();
        if let Some(link) = self.styles.theme_link() {
            out.push_str(&link);
            out.push('\n');
        }
        out.push_str("<div class=\"");
        out.push_str(class);
        out.push('"');
        let style = self.styles.inline_style();
        if !style.is_empty() {
            out.push_str(" style=\"");
            escape_attr(&style, &mut out);
            out.push('"');
        }
        out.push('>');
        out.push_str(&inner);
        out.push_str("</div>");
        out
    }
}

/// Per-generation resolution results. Each cell is filled at most once.
struct Resolution {
    generation: u64,
    key: ResolutionKey,
    background: Option<String>,
    custom_theme: OnceCell<Option<String>>,
    layout_source: OnceCell<Option<String>>,
}

struct ViewState {
    /// Raw frontmatter text of the last render; `None` before the first one.
    last_block: Option<Option<String>>,
    resolution: Option<Arc<Resolution>>,
    generation: u64,
    /// Generation whose layout was compiled, and whether that succeeded.
    compiled: Option<(u64, bool)>,
    ready_sent: Option<u64>,
    highlight: HighlightTheme,
    layouts: LayoutRenderer,
}

/// Renders slide documents for one visible slide surface.
pub struct SlideView<H> {
    host: H,
    config: RenderConfig,
    pipeline: MarkdownPipeline,
    resolver: ResourceResolver,
    scaler: Arc<Scaler>,
    on_error: Option<ErrorHandler>,
    state: Mutex<ViewState>,
}

impl<H: HostChannel> SlideView<H> {
    pub fn new(host: H, config: RenderConfig) -> Self {
        let resolver = match config.base_url.as_deref() {
            Some(base) => ResourceResolver::new(base),
            None => ResourceResolver::passthrough(),
        };
        let scaler = Scaler::new(
            ScaleCalculator::new(config.canvas, config.scale_ceiling),
            config.scale_variable.clone(),
        );
        Self {
            host,
            pipeline: MarkdownPipeline::new(&config),
            state: Mutex::new(ViewState {
                last_block: None,
                resolution: None,
                generation: 0,
                compiled: None,
                ready_sent: None,
                highlight: HighlightTheme::default(),
                layouts: LayoutRenderer::with_syntax(config.template_syntax, resolver.clone()),
            }),
            resolver,
            scaler: Arc::new(scaler),
            on_error: None,
            config,
        }
    }

    /// Sets the handler receiving markdown pipeline failures.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RenderError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The scaler owned by this view.
    pub fn scaler(&self) -> &Arc<Scaler> {
        &self.scaler
    }

    /// The current metadata generation (0 before the first render).
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Name of the highlighting theme in use.
    pub fn highlight_theme(&self) -> String {
        self.lock().highlight.name().to_string()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Asks the host for its active color theme and switches code
    /// highlighting to it. Host failures keep the current theme.
    pub async fn refresh_theme(&self) -> String {
        let theme = match self.host.active_theme().await {
            Ok(description) => HighlightTheme::resolve(description.as_ref()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch the active theme");
                return self.highlight_theme();
            }
        };
        let name = theme.name().to_string();
        self.lock().highlight = theme;
        tracing::debug!(theme = %name, "highlight theme refreshed");
        name
    }

    /// Forgets the previous slide; the next render starts a new generation
    /// and signals readiness again.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.last_block = None;
        state.resolution = None;
    }

    /// Picks the resolution for this document, starting a new generation when
    /// a resolution field changed.
    fn begin(&self, block: Option<&str>, metadata: &SlideMetadata) -> Arc<Resolution> {
        let mut state = self.lock();

        if let Some(current) = &state.resolution {
            let same_block = state.last_block.as_ref().map(|b| b.as_deref()) == Some(block);
            if same_block || current.key == metadata.resolution_key() {
                let current = Arc::clone(current);
                state.last_block = Some(block.map(str::to_string));
                return current;
            }
        }

        state.generation += 1;
        let resolution = Arc::new(Resolution {
            generation: state.generation,
            key: metadata.resolution_key(),
            background: resolve_background(metadata.image.as_deref(), &self.resolver),
            custom_theme: OnceCell::new(),
            layout_source: OnceCell::new(),
        });
        state.last_block = Some(block.map(str::to_string));
        state.resolution = Some(Arc::clone(&resolution));
        tracing::debug!(generation = state.generation, "metadata generation started");
        resolution
    }

    async fn fetch_layout(&self, path: &str) -> Option<String> {
        match self.host.fetch_file(path).await {
            Ok(Some(source)) if !source.trim().is_empty() => Some(source),
            Ok(_) => {
                tracing::warn!(path, "custom layout not found, rendering without it");
                None
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "failed to fetch custom layout");
                None
            }
        }
    }

    /// Renders a slide document.
    ///
    /// Returns `None` when the body is not renderable yet (pipeline failure)
    /// or when a newer generation superseded this render.
    pub async fn render(&self, source: &str) -> Option<RenderedSlide> {
        let extracted = extract(source);
        let metadata = extracted.metadata;
        let resolution = self.begin(metadata_block(source), &metadata);
        let generation = resolution.generation;

        let custom_theme = match metadata.custom_theme.as_deref() {
            Some(theme) => resolution
                .custom_theme
                .get_or_init(|| resolve_custom_theme(&self.host, theme))
                .await
                .clone(),
            None => None,
        };

        let body = two_column(extracted.body, &self.config.column_marker);
        let highlight = HighlightStage::new(self.lock().highlight.clone());
        let images = ImageStage::new(self.resolver.clone());
        let stages: [&dyn TreeStage; 2] = [&highlight, &images];
        let output = self.pipeline.transform(&body, &stages, |err| {
            tracing::warn!(error = %err, "slide body not renderable");
            if let Some(handler) = &self.on_error {
                handler(err);
            }
        })?;

        let layout = match metadata.custom_layout.as_deref() {
            Some(path) => resolution
                .layout_source
                .get_or_init(|| self.fetch_layout(path))
                .await
                .as_deref()
                .map(|source| (path, source)),
            None => None,
        };

        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding stale render"
            );
            return None;
        }

        let body = match layout {
            Some((path, layout_source)) => {
                let content = output.to_html();
                let rendered = render_layout(
                    &mut state,
                    generation,
                    path,
                    layout_source,
                    &metadata,
                    &content,
                    self.resolver.base(),
                );
                match rendered {
                    Ok(markup) => SlideBody::Markup(markup),
                    Err(err) => {
                        tracing::warn!(path, error = %err, "custom layout failed, rendering without it");
                        SlideBody::Tree(output.into_tree())
                    }
                }
            }
            None => SlideBody::Tree(output.into_tree()),
        };

        let first_for_generation = state.ready_sent != Some(generation);
        state.ready_sent = Some(generation);
        drop(state);

        if first_for_generation {
            self.host.slide_ready();
        }
        self.scaler.content_settled();

        Some(RenderedSlide {
            metadata,
            body,
            styles: InjectedStyles {
                custom_theme,
                background: resolution.background.clone(),
                scale: self.scaler.css_declaration(),
            },
            generation,
        })
    }
}

/// Compiles the layout once per generation and renders it.
fn render_layout(
    state: &mut ViewState,
    generation: u64,
    path: &str,
    source: &str,
    metadata: &SlideMetadata,
    content: &str,
    web_view_url: Option<&str>,
) -> Result<String, RenderError> {
    let compiled = match state.compiled {
        Some((compiled_for, ok)) if compiled_for == generation => ok,
        _ => {
            let result = state.layouts.load(path, source);
            let ok = result.is_ok();
            state.compiled = Some((generation, ok));
            result?;
            ok
        }
    };
    if !compiled {
        return Err(RenderError::TemplateError(format!(
            "layout '{}' failed to compile",
            path
        )));
    }

    let ctx = TemplateContext::new(metadata, content, web_view_url)?;
    state.layouts.render_loaded(path, &ctx)
}

impl<H> std::fmt::Debug for SlideView<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideView")
            .field("config", &self.config)
            .field("scaler", &self.scaler)
            .finish_non_exhaustive()
    }
}
