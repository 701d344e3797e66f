// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Brand-style compliance auditing for web pages.
//!
//! Pages are fetched, reduced to visible text, and scored against a
//! brand guideline by an external analysis service. Flagged elements can
//! be captured as PNG snapshots with headless Chromium.

#![allow(clippy::new_without_default)]

pub mod acquisition;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod progress;
pub mod renderer;
pub mod rest;
pub mod snapshot;
pub mod types;

pub use error::AuditError;
pub use orchestrator::{AuditRun, Orchestrator};
pub use types::{AuditRequest, AuditResult, AuditStatus, ComplianceReport};
