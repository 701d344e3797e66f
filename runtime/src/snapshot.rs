// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Element snapshot capture.
//!
//! Each call owns one browser from launch to shutdown. Selectors are tried
//! independently; a selector that matches nothing or fails to render is
//! skipped and logged, so an empty result is still a success.

use crate::error::AuditError;
use crate::renderer::{BrowserLauncher, RenderContext, Renderer};
use crate::types::Screenshot;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timing knobs for one capture call.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Navigation budget, and the upper bound on waiting for network idle.
    pub timeout_ms: u64,
    /// Quiet period before capturing starts.
    pub network_idle_ms: u64,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            network_idle_ms: 500,
        }
    }
}

/// Drop blank selectors and repeats, keeping first-seen order.
pub fn dedup_selectors(selectors: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    selectors
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(String::from)
        .collect()
}

/// Capture one snapshot per resolvable selector on `url`.
///
/// Fails only when the browser cannot be launched or the page cannot be
/// loaded. The browser is shut down on every exit path, including a panic
/// inside the capture body. If this future is dropped early, the renderer's
/// own `Drop` releases the browser.
pub async fn capture_elements(
    launcher: &dyn BrowserLauncher,
    url: &str,
    selectors: &[String],
    opts: CaptureOptions,
) -> Result<Vec<Screenshot>, AuditError> {
    let selectors = dedup_selectors(selectors);
    if selectors.is_empty() {
        return Ok(Vec::new());
    }

    let renderer = launcher
        .launch()
        .await
        .map_err(|e| AuditError::CaptureFailed(format!("{e:#}")))?;

    let outcome = AssertUnwindSafe(capture_with(renderer.as_ref(), url, &selectors, opts))
        .catch_unwind()
        .await;

    if let Err(e) = renderer.shutdown().await {
        warn!(url, "browser shutdown failed: {e:#}");
    }

    match outcome {
        Ok(result) => result,
        Err(_) => Err(AuditError::CaptureFailed(
            "capture aborted by a panic in the rendering context".into(),
        )),
    }
}

async fn capture_with(
    renderer: &dyn Renderer,
    url: &str,
    selectors: &[String],
    opts: CaptureOptions,
) -> Result<Vec<Screenshot>, AuditError> {
    let mut ctx = renderer
        .new_context()
        .await
        .map_err(|e| AuditError::CaptureFailed(format!("{e:#}")))?;

    let shots = match load_page(ctx.as_mut(), url, opts).await {
        Ok(()) => capture_each(ctx.as_ref(), url, selectors, opts).await,
        Err(e) => {
            let _ = ctx.close().await;
            return Err(e);
        }
    };

    if let Err(e) = ctx.close().await {
        debug!(url, "context close failed: {e:#}");
    }

    info!(
        url,
        requested = selectors.len(),
        captured = shots.len(),
        "element capture finished"
    );
    Ok(shots)
}

async fn load_page(
    ctx: &mut dyn RenderContext,
    url: &str,
    opts: CaptureOptions,
) -> Result<(), AuditError> {
    let nav = ctx
        .navigate(url, opts.timeout_ms)
        .await
        .map_err(|e| AuditError::CaptureFailed(format!("{e:#}")))?;
    debug!(url, final_url = %nav.final_url, load_ms = nav.load_time_ms, "page loaded");

    // A page that never settles is still captured as-is.
    if let Err(e) = ctx
        .wait_for_network_idle(opts.network_idle_ms, opts.timeout_ms)
        .await
    {
        warn!(url, "continuing without network idle: {e:#}");
    }
    Ok(())
}

async fn capture_each(
    ctx: &dyn RenderContext,
    url: &str,
    selectors: &[String],
    opts: CaptureOptions,
) -> Vec<Screenshot> {
    let per_selector = Duration::from_millis(opts.timeout_ms);
    let mut shots = Vec::with_capacity(selectors.len());

    for selector in selectors {
        let attempt = tokio::time::timeout(per_selector, ctx.capture_element(selector)).await;
        let skipped = match attempt {
            Ok(Ok(Some(image_bytes))) => {
                shots.push(Screenshot {
                    selector: selector.clone(),
                    image_bytes,
                });
                continue;
            }
            Ok(Ok(None)) => skip(selector, "no matching element"),
            Ok(Err(e)) => skip(selector, &format!("{e:#}")),
            Err(_) => skip(selector, "capture timed out"),
        };
        warn!(url, "{skipped}");
    }

    shots
}

fn skip(selector: &str, reason: &str) -> AuditError {
    AuditError::CaptureSkipped {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_selectors() {
        let input = vec![
            "#hero".to_string(),
            " #hero ".to_string(),
            "".to_string(),
            "h1".to_string(),
        ];
        assert_eq!(dedup_selectors(&input), vec!["#hero", "h1"]);
    }

    #[test]
    fn test_default_options() {
        let opts = CaptureOptions::default();
        assert_eq!(opts.timeout_ms, 30_000);
        assert_eq!(opts.network_idle_ms, 500);
    }
}
