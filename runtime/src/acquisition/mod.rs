// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page acquisition: URL normalization, HTTP fetch, text extraction, and
//! same-domain link discovery. Plain HTTP only; the browser is reserved for
//! element snapshots.

pub mod http_client;
pub mod links;
pub mod text;
pub mod url_norm;
