//! # Slidedeck Render - Markdown Slide Rendering
//!
//! `slidedeck-render` turns markdown slide documents into presentation markup
//! scaled to fit any viewport.
//!
//! A slide document is markdown with an optional YAML frontmatter block naming
//! a theme, a layout, a background image or a custom template. Rendering runs
//! metadata extraction, two-column preprocessing, markdown conversion, optional
//! layout templating and style injection. Separately, a [`Scaler`] keeps the
//! fixed 960×540 canvas fitted to its container.
//!
//! ## Core Concepts
//!
//! - [`SlideMetadata`]: Typed frontmatter, unknown keys preserved
//! - [`MarkdownPipeline`]: Body to [`RenderTree`], with [`TreeStage`] extensions
//! - [`LayoutRenderer`]: Handlebars custom layouts wrapping the rendered body
//! - [`ResourceResolver`]: Idempotent resolution of relative resource paths
//! - [`Scaler`]: The canvas scale factor, with subscribe/notify
//! - [`SlideView`]: The whole flow for one visible slide, talking to the host
//!   through a [`HostChannel`]
//!
//! ## Quick Start
//!
//! ```rust
//! use slidedeck_render::{MarkdownPipeline, RenderConfig, metadata};
//!
//! let doc = "---\ntitle: Welcome\nlayout: intro\n---\n# Hello *slides*";
//! let extracted = metadata::extract(doc);
//! assert_eq!(extracted.metadata.layout.as_deref(), Some("intro"));
//!
//! let pipeline = MarkdownPipeline::new(&RenderConfig::default());
//! let output = pipeline
//!     .transform(extracted.body, &[], |err| eprintln!("{err}"))
//!     .unwrap();
//! assert_eq!(output.to_html(), "<h1>Hello <em>slides</em></h1>");
//! ```
//!
//! ## Rendering Through the Host
//!
//! ```rust
//! use slidedeck_render::{MessageHost, RenderConfig, SlideView};
//! use slidedeck_render::host::HostMessage;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let (host, mut messages) = MessageHost::channel();
//! let view = SlideView::new(host, RenderConfig::default());
//!
//! let slide = view.render("# Title\n\nLeft ::right:: Right").await.unwrap();
//! assert!(slide.to_html().contains("slide__right"));
//! assert!(matches!(messages.recv().await, Some(HostMessage::SlideReady)));
//! # });
//! ```
//!
//! ## Scaling
//!
//! ```rust
//! use slidedeck_render::{ContainerBox, Scaler};
//!
//! let scaler = Scaler::default();
//! scaler.on_resize(ContainerBox::new(1920.0, 1080.0));
//! assert_eq!(scaler.css_declaration(), "--slide-scale: 2;");
//! ```

pub mod config;
pub mod deck;
mod error;
pub mod host;
pub mod markdown;
pub mod metadata;
pub mod preprocess;
pub mod resolve;
pub mod scale;
pub mod style;
pub mod template;
pub mod theme;
pub mod view;

// Error type
pub use error::RenderError;

pub use config::RenderConfig;
pub use deck::{parse_deck, Slide};
pub use host::{HostChannel, HostError, MessageHost};
pub use markdown::{
    HighlightStage, ImageStage, MarkdownPipeline, Node, RenderOutput, RenderTree, TreeStage,
};
pub use metadata::SlideMetadata;
pub use resolve::{resolve_image_sources, ResourceResolver};
pub use scale::{CanvasSize, ContainerBox, ScaleCalculator, Scaler, SubscriptionId};
pub use style::InjectedStyles;
pub use template::{
    HandlebarsEngine, LayoutRenderer, MiniJinjaEngine, TemplateContext, TemplateEngine,
    TemplateSyntax,
};
pub use theme::{
    detect_color_mode, set_theme_detector, ColorMode, HighlightTheme, ThemeDescription, ThemeKind,
};
pub use view::{RenderedSlide, SlideBody, SlideView};
