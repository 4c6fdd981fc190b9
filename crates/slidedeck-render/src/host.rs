//! The asynchronous boundary to the hosting surface.
//!
//! The renderer never touches the file system or the editor directly. It asks
//! the host for template sources, for webview URIs of workspace paths, and for
//! the active color theme, and it tells the host when a slide is ready.
//!
//! [`HostChannel`] is the seam; [`MessageHost`] implements it over a tokio
//! channel, pairing every request with a oneshot reply:
//!
//! ```rust
//! use slidedeck_render::host::{HostChannel, HostMessage, HostRequest, HostResponse, MessageHost};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let (host, mut rx) = MessageHost::channel();
//!
//! tokio::spawn(async move {
//!     while let Some(HostMessage::Request { request, reply }) = rx.recv().await {
//!         if let HostRequest::ResolveUri { path } = request {
//!             let _ = reply.send(HostResponse::Uri(format!("https://host.local/{path}")));
//!         }
//!     }
//! });
//!
//! let uri = host.resolve_uri("theme.css").await.unwrap();
//! assert_eq!(uri, "https://host.local/theme.css");
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::theme::ThemeDescription;

/// Failure of a host request.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host side of the channel is gone.
    #[error("host channel closed")]
    Closed,

    /// The host answered the request with an error.
    #[error("host rejected request: {0}")]
    Rejected(String),

    /// The host answered with a response of the wrong kind.
    #[error("unexpected host response: {0}")]
    Unexpected(String),
}

/// Requests the renderer issues to its host.
#[async_trait]
pub trait HostChannel: Send + Sync {
    /// Reads a workspace file. `Ok(None)` means the file does not exist.
    async fn fetch_file(&self, path: &str) -> Result<Option<String>, HostError>;

    /// Converts a workspace path into a URI the rendering surface can load.
    async fn resolve_uri(&self, path: &str) -> Result<String, HostError>;

    /// The host's active color theme, if it reports one.
    async fn active_theme(&self) -> Result<Option<ThemeDescription>, HostError>;

    /// Fire-and-forget notification that the slide finished rendering.
    fn slide_ready(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    FetchFile { path: String },
    ResolveUri { path: String },
    ActiveTheme,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    File(Option<String>),
    Uri(String),
    Theme(Option<ThemeDescription>),
    /// The request failed on the host side.
    Error(String),
}

/// A message travelling from the renderer to the host.
#[derive(Debug)]
pub enum HostMessage {
    Request {
        request: HostRequest,
        reply: oneshot::Sender<HostResponse>,
    },
    SlideReady,
}

/// [`HostChannel`] over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct MessageHost {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl MessageHost {
    pub fn new(tx: mpsc::UnboundedSender<HostMessage>) -> Self {
        Self { tx }
    }

    /// Creates a host together with the receiver the host side listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    async fn request(&self, request: HostRequest) -> Result<HostResponse, HostError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(HostMessage::Request { request, reply })
            .map_err(|_| HostError::Closed)?;
        match response.await {
            Ok(HostResponse::Error(message)) => Err(HostError::Rejected(message)),
            Ok(response) => Ok(response),
            Err(_) => Err(HostError::Closed),
        }
    }
}

#[async_trait]
impl HostChannel for MessageHost {
    async fn fetch_file(&self, path: &str) -> Result<Option<String>, HostError> {
        match self
            .request(HostRequest::FetchFile {
                path: path.to_string(),
            })
            .await?
        {
            HostResponse::File(content) => Ok(content),
            other => Err(HostError::Unexpected(format!("{other:?}"))),
        }
    }

    async fn resolve_uri(&self, path: &str) -> Result<String, HostError> {
        match self
            .request(HostRequest::ResolveUri {
                path: path.to_string(),
            })
            .await?
        {
            HostResponse::Uri(uri) => Ok(uri),
            other => Err(HostError::Unexpected(format!("{other:?}"))),
        }
    }

    async fn active_theme(&self) -> Result<Option<ThemeDescription>, HostError> {
        match self.request(HostRequest::ActiveTheme).await? {
            HostResponse::Theme(theme) => Ok(theme),
            other => Err(HostError::Unexpected(format!("{other:?}"))),
        }
    }

    fn slide_ready(&self) {
        if self.tx.send(HostMessage::SlideReady).is_err() {
            tracing::debug!("slide ready dropped: host channel closed");
        }
    }
}
