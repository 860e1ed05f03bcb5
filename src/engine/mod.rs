//! Browser engine abstraction.
//!
//! Defines the `MediaEngine` and `EngineSession` traits that abstract
//! over the browser (currently Chromium via chromiumoxide), plus the
//! projection of a network response event that the interception
//! extractor consumes.

pub mod chromium;
pub mod lease;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// What the interceptor needs from one observed network response.
#[derive(Debug, Clone)]
pub struct NetworkExchange {
    /// Response URL.
    pub url: String,
    /// Declared content type, lowercased ("" when absent).
    pub content_type: String,
    /// Declared content length; `None` when absent or unparsable.
    pub content_length: Option<u64>,
}

/// A browser engine that can derive isolated sessions.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Open a new session (page) with a realistic user-agent.
    async fn new_session(&self) -> Result<Box<dyn EngineSession>>;
    /// Whether the underlying engine process is still reachable.
    fn is_connected(&self) -> bool;
    /// Number of currently open sessions.
    fn active_sessions(&self) -> usize;
    /// Shut down the engine process.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browsing session owned by one in-flight extraction.
#[async_trait]
pub trait EngineSession: Send {
    /// Subscribe to network response events. Must be called before
    /// `navigate` so early activity is not missed.
    async fn network_events(&self) -> Result<BoxStream<'static, NetworkExchange>>;
    /// Navigate to a URL and wait for the page to settle. No internal
    /// timeout — callers bound this with their own.
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// The page's displayed title.
    async fn title(&self) -> Result<Option<String>>;
    /// Find an element by CSS selector and click it.
    async fn click(&self, selector: &str) -> Result<()>;
    /// Close this session, releasing the page.
    async fn close(self: Box<Self>) -> Result<()>;
}
