//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! This agent calls the Gemini REST API directly. The shared binding is
//! cloned per role agent, each clone carrying its own system instruction.
//! When the google_search tool is enabled the request advertises it, which
//! is how the role profiles' search capability is realized.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode, header::HeaderValue};
use sana_core::agent::AgentError;
use sana_core::knowledge::{KnowledgeContext, KnowledgePayload};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PDF_MIME_TYPE: &str = "application/pdf";

/// Agent binding that talks to the Gemini HTTP API.
#[derive(Clone, Debug)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: Option<String>,
    google_search: bool,
}

impl GeminiApiAgent {
    /// Creates a new binding with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system_instruction: None,
            google_search: false,
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a system instruction that will be sent alongside every request.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Enables the google_search tool on every request.
    pub fn with_google_search(mut self) -> Self {
        self.google_search = true;
        self
    }

    /// The model this binding targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates a text response for the prompt, with the knowledge
    /// context's documents attached.
    pub async fn generate(
        &self,
        prompt: &str,
        knowledge: &KnowledgeContext,
    ) -> Result<String, AgentError> {
        let contents = vec![Content {
            role: "user".to_string(),
            parts: build_parts(prompt, knowledge)?,
        }];

        let system_instruction = self.system_instruction.as_ref().map(|text| Content {
            role: "system".to_string(),
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        });

        let tools = if self.google_search {
            Some(vec![Tool::default()])
        } else {
            None
        };

        let request = GenerateContentRequest {
            contents,
            system_instruction,
            tools,
        };
        self.send_request(&request).await
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, AgentError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| AgentError::Process {
                status_code: None,
                message: format!("Gemini API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AgentError::Other(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

fn build_parts(prompt: &str, knowledge: &KnowledgeContext) -> Result<Vec<Part>, AgentError> {
    let mut parts = Vec::new();

    for source in knowledge.sources() {
        match &source.payload {
            KnowledgePayload::Text(text) => parts.push(Part::Text {
                text: format!("Reference document \"{}\":\n{}", source.name, text),
            }),
            KnowledgePayload::Bytes(bytes) => parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: PDF_MIME_TYPE.to_string(),
                    data: BASE64_STANDARD.encode(bytes),
                },
            }),
        }
    }

    if !prompt.trim().is_empty() {
        parts.push(Part::Text {
            text: prompt.to_string(),
        });
    }

    if parts.is_empty() {
        return Err(AgentError::ExecutionFailed(
            "Gemini payload must include text or attached documents".into(),
        ));
    }

    Ok(parts)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
struct Tool {
    #[serde(rename = "google_search")]
    google_search: GoogleSearchConfig,
}

#[derive(Serialize, Default)]
struct GoogleSearchConfig {}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AgentError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            AgentError::ExecutionFailed(
                "Gemini API returned no text in the response candidates".into(),
            )
        })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> AgentError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    if let Some(delay) = retry_after {
        AgentError::process_error_with_retry_after(status.as_u16(), message, is_retryable, delay)
    } else {
        AgentError::Process {
            status_code: Some(status.as_u16()),
            message,
            is_retryable,
            retry_after: None,
        }
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use sana_core::knowledge::{
        KnowledgeKind, KnowledgeOrigin, KnowledgeSource,
    };

    fn text_source(name: &str, content: &str) -> KnowledgeSource {
        KnowledgeSource {
            name: name.to_string(),
            kind: KnowledgeKind::Text,
            origin: KnowledgeOrigin::Uploaded,
            payload: KnowledgePayload::Text(content.to_string()),
        }
    }

    #[test]
    fn parts_include_prompt_and_labeled_documents() {
        let knowledge = KnowledgeContext::new(vec![text_source("coping.txt", "breathe")]);
        let parts = build_parts("next question please", &knowledge).unwrap();
        assert_eq!(parts.len(), 2);

        let json = serde_json::to_value(&parts).unwrap();
        let first = json[0]["text"].as_str().unwrap();
        assert!(first.contains("coping.txt"));
        assert!(first.contains("breathe"));
        assert_eq!(json[1]["text"], "next question please");
    }

    #[test]
    fn pdf_sources_become_inline_data() {
        let knowledge = KnowledgeContext::new(vec![KnowledgeSource {
            name: "PHQ-9.pdf".to_string(),
            kind: KnowledgeKind::Pdf,
            origin: KnowledgeOrigin::Default,
            payload: KnowledgePayload::Bytes(vec![0x25, 0x50, 0x44, 0x46]),
        }]);
        let parts = build_parts("hello", &knowledge).unwrap();

        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0]["inlineData"]["mimeType"], PDF_MIME_TYPE);
        assert_eq!(
            json[0]["inlineData"]["data"],
            BASE64_STANDARD.encode([0x25, 0x50, 0x44, 0x46])
        );
    }

    #[test]
    fn empty_prompt_without_documents_is_rejected() {
        let err = build_parts("   ", &KnowledgeContext::default()).unwrap_err();
        assert!(matches!(err, AgentError::ExecutionFailed(_)));
    }

    #[test]
    fn response_text_is_extracted_from_last_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "How have you been sleeping?"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_text_response(response).unwrap(),
            "How have you been sleeping?"
        );
    }

    #[test]
    fn empty_response_is_an_execution_failure() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            extract_text_response(response),
            Err(AgentError::ExecutionFailed(_))
        ));
    }

    #[test]
    fn rate_limit_errors_are_retryable() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#
                .to_string(),
            Some(Duration::from_secs(7)),
        );
        assert!(err.is_retryable());
        match err {
            AgentError::Process {
                status_code,
                retry_after,
                message,
                ..
            } => {
                assert_eq!(status_code, Some(429));
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
                assert!(message.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
