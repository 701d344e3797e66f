// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for headless page rendering.
//!
//! A [`BrowserLauncher`] starts a fresh browser per capture call; the
//! [`Renderer`] it returns hands out isolated [`RenderContext`]s (tabs).
//! Chromium via chromiumoxide is the production implementation.

pub mod chromium;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a new, private browser instance.
    async fn launch(&self) -> Result<Box<dyn Renderer>>;
}

/// A running browser that can create rendering contexts.
///
/// Implementations must also release the browser when dropped without
/// [`Renderer::shutdown`], which happens when a capture is cancelled.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Terminate the browser process.
    async fn shutdown(self: Box<Self>) -> Result<()>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Capture a PNG of the element matched by `selector`.
    ///
    /// `Ok(None)` when nothing matches.
    async fn capture_element(&self, selector: &str) -> Result<Option<Vec<u8>>>;

    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Wait until the page stops requesting resources.
    ///
    /// Polls the resource timing buffer; the page counts as idle once the
    /// document is complete and no new resource appeared for `idle_ms`.
    async fn wait_for_network_idle(&self, idle_ms: u64, timeout_ms: u64) -> Result<()> {
        const PROBE: &str = "JSON.stringify({ready: document.readyState, \
                             resources: performance.getEntriesByType('resource').length})";
        let poll = Duration::from_millis(100);
        let started = Instant::now();
        let mut last_count: Option<u64> = None;
        let mut stable_since = Instant::now();

        loop {
            let raw = self.execute_js(PROBE).await?;
            let probe: serde_json::Value = match raw {
                serde_json::Value::String(s) => serde_json::from_str(&s)?,
                other => other,
            };
            let complete = probe["ready"].as_str() == Some("complete");
            let count = probe["resources"].as_u64().unwrap_or(0);

            if last_count != Some(count) || !complete {
                last_count = Some(count);
                stable_since = Instant::now();
            } else if stable_since.elapsed() >= Duration::from_millis(idle_ms) {
                return Ok(());
            }

            if started.elapsed() >= Duration::from_millis(timeout_ms) {
                bail!("network did not settle within {timeout_ms}ms");
            }
            tokio::time::sleep(poll).await;
        }
    }
}
