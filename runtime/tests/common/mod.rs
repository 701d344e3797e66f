//! Shared fakes for integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use brand_audit::analysis::Analyzer;
use brand_audit::renderer::{BrowserLauncher, NavigationResult, RenderContext, Renderer};
use brand_audit::types::{AuditItem, ComplianceReport};
use brand_audit::AuditError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Counters shared between a launcher and everything it creates.
#[derive(Default)]
pub struct BrowserStats {
    pub launched: AtomicUsize,
    pub shut_down: AtomicUsize,
    /// Renderers dropped, with or without a shutdown first.
    pub released: AtomicUsize,
    pub open_contexts: AtomicUsize,
    pub captures: AtomicUsize,
}

/// How the fake page behaves.
#[derive(Clone, Copy, Default)]
pub enum PageBehavior {
    /// `#hero` and `h1` exist, `#broken` errors, everything else is missing.
    #[default]
    Normal,
    /// Navigation fails.
    Unreachable,
    /// Capturing `#panic` panics.
    PanicOnCapture,
    /// Navigation never finishes.
    Hang,
}

/// A browser that renders an imaginary page.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub stats: Arc<BrowserStats>,
    pub behavior: PageBehavior,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(behavior: PageBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        if self.fail_launch {
            bail!("no browser installed");
        }
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            stats: Arc::clone(&self.stats),
            behavior: self.behavior,
        }))
    }
}

struct FakeRenderer {
    stats: Arc<BrowserStats>,
    behavior: PageBehavior,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.stats.open_contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            stats: Arc::clone(&self.stats),
            behavior: self.behavior,
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        self.stats.shut_down.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.stats.open_contexts.load(Ordering::SeqCst)
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeContext {
    stats: Arc<BrowserStats>,
    behavior: PageBehavior,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        match self.behavior {
            PageBehavior::Unreachable => bail!("net::ERR_NAME_NOT_RESOLVED"),
            PageBehavior::Hang => std::future::pending::<()>().await,
            _ => {}
        }
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"ready": "complete", "resources": 2}))
    }

    async fn capture_element(&self, selector: &str) -> Result<Option<Vec<u8>>> {
        self.stats.captures.fetch_add(1, Ordering::SeqCst);
        match selector {
            "#hero" | "h1" => Ok(Some(FAKE_PNG.to_vec())),
            "#broken" => bail!("Node is detached from document"),
            "#panic" if matches!(self.behavior, PageBehavior::PanicOnCapture) => {
                panic!("renderer crashed")
            }
            _ => Ok(None),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.stats.open_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Flags the hero banner on every page.
pub struct FixedAnalyzer;

#[async_trait]
impl Analyzer for FixedAnalyzer {
    async fn analyze(&self, _: &str, _: &str, _: &str) -> Result<ComplianceReport, AuditError> {
        Ok(ComplianceReport {
            compliance_score: 64,
            flagged_issues: vec![
                AuditItem::new("Hero copy is off-brand").with_selector("#hero"),
                AuditItem::new("Stale promo").with_selector("#missing"),
            ],
            suggested_rewrites: vec![AuditItem::new("Built for makers")],
            recommendations: vec![AuditItem::new("Lead with the product")],
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
