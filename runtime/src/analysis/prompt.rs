// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prompt construction for chat-model analysis.

/// System message: role and output contract.
pub const SYSTEM_PROMPT: &str = "You are a meticulous brand editor. You audit web page copy \
against a company's brand style guidelines and respond with a single JSON object and nothing else.";

/// Exact JSON shape the model must produce.
pub const RESPONSE_SHAPE: &str = r#"{
  "complianceScore": <integer 0-100>,
  "flaggedIssues": [{"text": "<issue, quoting the offending passage>", "selector": "<optional CSS selector>"}],
  "suggestedRewrites": [{"text": "<rewritten passage>", "selector": "<optional CSS selector>"}],
  "recommendations": [{"text": "<strategic recommendation>", "selector": "<optional CSS selector>"}]
}"#;

/// Build the user message for one page.
pub fn build_user_prompt(guideline_text: &str, page_text: &str, url: &str) -> String {
    format!(
        "Audit the page below against the brand guidelines.\n\n\
         ## Brand guidelines\n{guidelines}\n\n\
         ## Page\nURL: {url}\n\n{page}\n\n\
         ## Instructions\n\
         - Score overall compliance from 0 (ignores the guidelines) to 100 (fully compliant).\n\
         - Flag each passage that breaks a guideline and say which rule it breaks.\n\
         - Suggest a rewrite for each flagged passage.\n\
         - Give strategic recommendations for the page as a whole.\n\
         - When an item refers to a specific element, add a CSS selector that matches exactly \
           one element on the page. Prefer ids, then stable classes. Omit the selector when unsure.\n\
         - Any list may be empty but every key must be present.\n\n\
         Respond with JSON of exactly this shape:\n{shape}",
        guidelines = guideline_text.trim(),
        url = url,
        page = page_text.trim(),
        shape = RESPONSE_SHAPE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_all_inputs() {
        let p = build_user_prompt("Always say 'we'.", "They make widgets.", "https://a.com/");
        assert!(p.contains("Always say 'we'."));
        assert!(p.contains("They make widgets."));
        assert!(p.contains("URL: https://a.com/"));
        assert!(p.contains("\"complianceScore\""));
    }

    #[test]
    fn test_prompt_names_every_response_key() {
        for key in ["flaggedIssues", "suggestedRewrites", "recommendations", "selector"] {
            assert!(RESPONSE_SHAPE.contains(key), "{key}");
        }
    }
}
