// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Async HTTP client wrapping reqwest.
//!
//! Fetches raw page markup with a desktop browser identity. No retries: a
//! failed fetch fails that URL's audit and nothing else.

use crate::error::AuditError;
use std::time::Duration;
use tracing::debug;

/// Desktop Chrome user-agent sent with every page fetch.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

/// Accept header favoring HTML.
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// Content-Type header, if any.
    pub content_type: Option<String>,
    /// Response body as text.
    pub body: String,
}

/// HTTP client for page acquisition.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a standard Chrome user-agent.
    pub fn new(timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }

    /// Perform a single GET. Any transport error or non-2xx status is a
    /// `FetchFailed`.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, AuditError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuditError::FetchFailed {
                status_code: Some(status.as_u16()),
                cause: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = resp.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            final_url,
            content_type,
            body,
        })
    }

    /// Fetch a page and return only its body text.
    ///
    /// Redirects and non-HTML responses are logged; the body is used as-is.
    pub async fn fetch_markup(&self, url: &str) -> Result<String, AuditError> {
        let resp = self.get(url).await?;
        if resp.final_url != url {
            debug!(url, final_url = %resp.final_url, "followed redirect");
        }
        if let Some(ct) = resp.content_type.as_deref() {
            if !is_markup(ct) {
                debug!(url, content_type = ct, "response is not HTML");
            }
        }
        Ok(resp.body)
    }
}

fn is_markup(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

fn transport_error(e: reqwest::Error) -> AuditError {
    let cause = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_redirect() {
        format!("too many redirects: {e}")
    } else {
        e.to_string()
    };
    AuditError::FetchFailed {
        status_code: e.status().map(|s| s.as_u16()),
        cause,
    }
}
