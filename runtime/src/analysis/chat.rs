// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Analyzer backed by an OpenAI-compatible chat-completions endpoint.

use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use super::service::snippet;
use super::{parse_report, Analyzer};
use crate::error::AuditError;
use crate::types::ComplianceReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct ChatAnalyzer {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl ChatAnalyzer {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_API_URL.to_string())
    }

    /// Create an analyzer against a custom OpenAI-compatible URL.
    pub fn with_url(api_key: String, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            model: "gpt-4o-mini".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        self
    }

    fn build_request(&self, guideline_text: &str, page_text: &str, url: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: build_user_prompt(guideline_text, page_text, url),
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl Analyzer for ChatAnalyzer {
    async fn analyze(
        &self,
        guideline_text: &str,
        page_text: &str,
        url: &str,
    ) -> Result<ComplianceReport, AuditError> {
        let request = self.build_request(guideline_text, page_text, url);

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuditError::AnalysisFailed(format!("model API unreachable: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(AuditError::AnalysisFailed(format!(
                "model API returned HTTP {status}: {}",
                snippet(&text)
            )));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AuditError::AnalysisFailed(format!("malformed model response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AuditError::AnalysisFailed("model returned no choices".into()))?;

        parse_report(strip_code_fence(&content))
    }

    fn name(&self) -> &str {
        "chat"
    }
}

/// Some models wrap JSON in a markdown fence despite json mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
