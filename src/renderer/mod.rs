//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). The monitor
//! core only ever talks to these traits, so tests drive it with scripted
//! fakes instead of a real browser.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create isolated rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browser context (tab).
///
/// Every waiting call is bounded by an explicit timeout; none may block
/// indefinitely.
#[async_trait]
pub trait RenderContext: Send {
    /// Navigate to a URL.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Wait until the page has settled (load complete plus a quiet period).
    async fn wait_for_idle(&mut self, timeout_ms: u64) -> Result<()>;
    /// Count elements matching a CSS selector.
    async fn count(&self, selector: &str) -> Result<usize>;
    /// Visible text of the first element matching a selector, if any.
    async fn inner_text(&self, selector: &str, timeout_ms: u64) -> Result<Option<String>>;
    /// Attribute value of the first element matching a selector, if any.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;
    /// Fill the first element matching a selector with a value.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<bool>;
    /// Click the first element matching a selector.
    async fn click(&mut self, selector: &str) -> Result<bool>;
    /// Click the first button-like control whose visible label contains the
    /// given text (case-insensitive).
    async fn click_labeled(&mut self, label: &str) -> Result<bool>;
    /// Activate the focused form via its default key (Enter).
    async fn press_enter(&mut self) -> Result<()>;
    /// Full serialized markup of the current document.
    async fn html(&self) -> Result<String>;
    /// Current URL.
    async fn url(&self) -> Result<String>;
    /// Full-page screenshot (PNG bytes).
    async fn screenshot(&self) -> Result<Vec<u8>>;
    /// Serialize the session (cookies) to an opaque blob.
    async fn save_session(&self) -> Result<String>;
    /// Restore a previously serialized session blob.
    async fn restore_session(&mut self, blob: &str) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
