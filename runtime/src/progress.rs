// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for audit telemetry.
//!
//! The orchestrator emits `ProgressEvent`s while a batch runs. They flow
//! through a `tokio::sync::broadcast` channel to any subscriber (CLI, SSE
//! clients). Each event also renders to one human-readable log line; the
//! ordered lines are returned with the batch. When no subscriber exists,
//! events are silently dropped.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A progress event emitted during a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The batch this event belongs to.
    pub request_id: String,
    /// Monotonically increasing sequence number within the batch.
    pub seq: u64,
    /// RFC 3339 emission time.
    pub timestamp: String,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// Request validated; URLs normalized.
    BatchStarted { url_count: usize, dropped: usize },
    /// A submitted URL could not be parsed and was dropped.
    UrlRejected { input: String, reason: String },
    /// Link discovery from the first URL finished.
    DiscoveryCompleted { start_url: String, added: usize },
    /// A pipeline step for one URL started or finished.
    Step {
        url: String,
        step: PipelineStep,
        detail: String,
    },
    /// A URL reached `success`.
    UrlSucceeded { url: String, score: u8 },
    /// A URL reached `error`.
    UrlFailed { url: String, message: String },
    /// Every URL is terminal.
    BatchComplete {
        succeeded: usize,
        failed: usize,
        elapsed_ms: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Stages of the per-URL pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStep {
    Fetch,
    Extract,
    Analyze,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => write!(f, "Fetch"),
            Self::Extract => write!(f, "Extract"),
            Self::Analyze => write!(f, "Analyze"),
        }
    }
}

impl std::fmt::Display for ProgressEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchStarted { url_count, dropped } if *dropped > 0 => write!(
                f,
                "Starting audit of {url_count} URL(s) ({dropped} invalid input(s) skipped)"
            ),
            Self::BatchStarted { url_count, .. } => {
                write!(f, "Starting audit of {url_count} URL(s)")
            }
            Self::UrlRejected { input, reason } => {
                write!(f, "Skipping invalid URL '{input}': {reason}")
            }
            Self::DiscoveryCompleted { start_url, added } => {
                write!(f, "Discovered {added} new same-domain page(s) from {start_url}")
            }
            Self::Step { url, step, detail } => write!(f, "[{step}] {url}: {detail}"),
            Self::UrlSucceeded { url, score } => {
                write!(f, "Completed {url} (score {score}/100)")
            }
            Self::UrlFailed { url, message } => write!(f, "Failed {url}: {message}"),
            Self::BatchComplete {
                succeeded,
                failed,
                elapsed_ms,
            } => write!(
                f,
                "Audit finished: {succeeded} succeeded, {failed} failed in {:.1}s",
                *elapsed_ms as f64 / 1000.0
            ),
            Self::Warning { message } => write!(f, "Warning: {message}"),
        }
    }
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emits events for one batch and records their log lines.
///
/// Cloning shares the sequence counter, so pipelines running concurrently
/// still produce strictly increasing `seq` values.
#[derive(Clone)]
pub struct Narrator {
    request_id: String,
    tx: Option<ProgressSender>,
    seq: Arc<AtomicU64>,
}

impl Narrator {
    pub fn new(request_id: impl Into<String>, tx: Option<ProgressSender>) -> Self {
        Self {
            request_id: request_id.into(),
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit `event` and append its rendered line to `log`.
    pub fn emit(&self, log: &mut Vec<String>, event: ProgressEventKind) {
        log.push(event.to_string());
        if let Some(ref sender) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(ProgressEvent {
                request_id: self.request_id.clone(),
                seq,
                timestamp: chrono::Utc::now().to_rfc3339(),
                event,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            request_id: "audit-1".to_string(),
            seq: 1,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            event: ProgressEventKind::Step {
                url: "https://a.com/".to_string(),
                step: PipelineStep::Fetch,
                detail: "fetching".to_string(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Step\""));
        assert!(json.contains("Fetch"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, "audit-1");
        assert_eq!(parsed.event, event.event);
    }

    #[test]
    fn test_lines_render() {
        assert_eq!(
            ProgressEventKind::UrlSucceeded {
                url: "https://a.com/".into(),
                score: 90
            }
            .to_string(),
            "Completed https://a.com/ (score 90/100)"
        );
        assert_eq!(
            ProgressEventKind::BatchStarted {
                url_count: 3,
                dropped: 1
            }
            .to_string(),
            "Starting audit of 3 URL(s) (1 invalid input(s) skipped)"
        );
        assert_eq!(
            ProgressEventKind::BatchComplete {
                succeeded: 2,
                failed: 1,
                elapsed_ms: 1500
            }
            .to_string(),
            "Audit finished: 2 succeeded, 1 failed in 1.5s"
        );
    }

    #[test]
    fn test_emit_without_sender_still_logs() {
        let narrator = Narrator::new("x", None);
        let mut log = Vec::new();
        narrator.emit(
            &mut log,
            ProgressEventKind::Warning {
                message: "test".into(),
            },
        );
        assert_eq!(log, vec!["Warning: test"]);
    }

    #[test]
    fn test_emit_with_no_receivers_does_not_panic() {
        let (tx, rx) = channel();
        drop(rx);
        let narrator = Narrator::new("x", Some(tx));
        narrator.emit(
            &mut Vec::new(),
            ProgressEventKind::Warning {
                message: "test".into(),
            },
        );
    }

    #[tokio::test]
    async fn test_sequence_shared_across_clones() {
        let (tx, mut rx) = channel();
        let a = Narrator::new("batch", Some(tx));
        let b = a.clone();
        let mut log = Vec::new();
        a.emit(&mut log, ProgressEventKind::Warning { message: "1".into() });
        b.emit(&mut log, ProgressEventKind::Warning { message: "2".into() });

        assert_eq!(rx.recv().await.unwrap().seq, 1);
        assert_eq!(rx.recv().await.unwrap().seq, 2);
    }
}
