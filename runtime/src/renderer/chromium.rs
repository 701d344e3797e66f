// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.

use super::{BrowserLauncher, NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Configured path (BRAND_AUDIT_CHROMIUM_PATH or --chromium)
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.clone());
        }
    }

    // 2. ~/.brand-audit/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".brand-audit/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".brand-audit/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".brand-audit/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".brand-audit/chromium/chrome-linux64/chrome"),
                home.join(".brand-audit/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one headless Chromium per call, each with its own profile dir.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    chromium_path: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(chromium_path: Option<PathBuf>) -> Self {
        Self { chromium_path }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        let chrome_path = find_chromium(self.chromium_path.as_ref())
            .context("Chromium not found. Set BRAND_AUDIT_CHROMIUM_PATH or install Chrome.")?;

        let profile_dir =
            std::env::temp_dir().join(format!("brand-audit-{}", uuid::Uuid::new_v4()));

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&profile_dir)
            .window_size(1366, 900)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--hide-scrollbars")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("chromium handler event error: {e}");
                }
            }
        });

        Ok(Box::new(ChromiumRenderer {
            browser,
            handler_task,
            profile_dir: ProfileDir(profile_dir),
            active_count: Arc::new(AtomicUsize::new(0)),
        }))
    }
}

/// Browser profile directory, removed when dropped.
struct ProfileDir(PathBuf);

impl Drop for ProfileDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("could not remove {}: {e}", self.0.display()),
        }
    }
}

/// A running headless Chromium.
///
/// Dropping it without [`Renderer::shutdown`] still releases the browser.
/// chromiumoxide kills the child process on drop and the profile directory
/// is removed right after.
pub struct ChromiumRenderer {
    // Field order is drop order: the process goes before its profile dir.
    browser: Browser,
    handler_task: JoinHandle<()>,
    profile_dir: ProfileDir,
    active_count: Arc<AtomicUsize>,
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        if let Err(e) = this.browser.close().await {
            warn!("chromium close failed, killing process: {e}");
            let _ = this.browser.kill().await;
        }
        let _ = this.browser.wait().await;
        this.handler_task.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&this.profile_dir.0).await {
            debug!("could not remove {}: {e}", this.profile_dir.0.display());
        }
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn capture_element(&self, selector: &str) -> Result<Option<Vec<u8>>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("selector lookup failed for '{selector}'"))?;

        let Some(element) = elements.first() else {
            return Ok(None);
        };
        if elements.len() > 1 {
            debug!(
                selector,
                matches = elements.len(),
                "selector is ambiguous, capturing first match"
            );
        }

        let png = element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .with_context(|| format!("element screenshot failed for '{selector}'"))?;
        Ok(Some(png))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_skipped() {
        let bogus = PathBuf::from("/definitely/not/a/chrome");
        let found = find_chromium(Some(&bogus));
        assert_ne!(found.as_ref(), Some(&bogus));
    }

    #[test]
    fn test_profile_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("brand-audit-profile");
        std::fs::create_dir_all(path.join("Default")).unwrap();
        std::fs::write(path.join("Default/Preferences"), b"{}").unwrap();

        drop(ProfileDir(path.clone()));
        assert!(!path.exists());

        // Already gone after an explicit shutdown.
        drop(ProfileDir(path));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_capture_existing_and_missing_selector() {
        let launcher = ChromiumLauncher::default();
        let renderer = launcher.launch().await.expect("failed to launch");
        let mut ctx = renderer.new_context().await.expect("failed to create context");

        ctx.navigate(
            "data:text/html,<div id='hero' style='width:200px;height:80px;background:red'>Hi</div>",
            10_000,
        )
        .await
        .expect("navigation failed");
        ctx.wait_for_network_idle(200, 5_000)
            .await
            .expect("network idle");

        let hero = ctx.capture_element("#hero").await.expect("capture");
        let png = hero.expect("hero should exist");
        assert_eq!(&png[1..4], b"PNG");
        assert!(ctx.capture_element("#missing").await.expect("lookup").is_none());

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);
        renderer.shutdown().await.expect("shutdown failed");
    }
}
