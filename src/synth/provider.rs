use super::error::SynthError;
use super::prompt::AnswerFormat;
use crate::constants::{CONNECT_TIMEOUT_SECS, PREFLIGHT_READ_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::debug;

// Canned bilingual answers for demo/offline operation. Marker-formatted so
// they flow through the normal splitting path.
const OFFLINE_ANSWER_DUAL: &str = "[KR]\n(데모 모드) 네트워크 연결 없이 제공되는 예시 답변입니다.\n\n\
     [EN]\n(Demo mode) This is a canned sample answer served without network access.";

const OFFLINE_ANSWER_TRIPLE: &str = "[KR_SHORT]\n(데모 모드) 예시 답변입니다.\n\n\
     [KR_LONG]\n(데모 모드) 네트워크 연결 없이 제공되는 예시 답변입니다. 실제 모델 응답이 아닙니다.\n\n\
     [EN]\n(Demo mode) This is a canned sample answer served without network access.";

pub fn canned_answer(format: AnswerFormat) -> &'static str {
    match format {
        AnswerFormat::Dual => OFFLINE_ANSWER_DUAL,
        AnswerFormat::Triple => OFFLINE_ANSWER_TRIPLE,
    }
}

/// One completion call: a fully rendered prompt pair plus sampling knobs.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system: String,
    pub user: String,
}

// Wire types for OpenAI-compatible chat completions.
// Docs: https://platform.openai.com/docs/api-reference/chat/create

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    messages: Vec<WireMessage>,
}

impl ChatRequest {
    fn from_request(request: &CompletionRequest, stream: bool) -> Self {
        Self {
            model: request.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub trait AnswerProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Cheap credential/connectivity check before the first turn.
    fn preflight(&self, _api_key: &str) -> Result<(), SynthError> {
        Ok(())
    }

    /// One blocking request, one text blob back. No retries.
    fn complete(&self, request: &CompletionRequest, api_key: &str) -> Result<String, SynthError>;

    /// Streaming variant: deltas are reported to `on_delta` for live
    /// display; the assembled full text is returned. Providers without
    /// streaming support fall back to one synthetic delta.
    fn complete_streaming(
        &self,
        request: &CompletionRequest,
        api_key: &str,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, SynthError> {
        let full = self.complete(request, api_key)?;
        on_delta(&full);
        Ok(full)
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(provider: &str, endpoint: &str) -> Result<Box<dyn AnswerProvider>, SynthError> {
        match provider.trim().to_lowercase().as_str() {
            "openai" => Ok(Box::new(OpenAiProvider::new(endpoint.to_string()))),
            "offline" => Ok(Box::new(OfflineProvider)),
            other => Err(SynthError::UnknownProvider(other.to_string())),
        }
    }
}

fn validate_key_basic(api_key: &str, provider: &str) -> Result<(), SynthError> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() {
        return Err(SynthError::MissingApiKey(provider.to_string()));
    }
    if trimmed.len() < 12 {
        return Err(SynthError::InvalidApiKey(format!(
            "{} key is too short",
            provider
        )));
    }
    Ok(())
}

/// HTTP status → failure kind. Body text is truncated so provider error
/// pages don't flood the transcript area.
fn classify_status(code: u16, body: &str) -> SynthError {
    let mut detail = body.trim().to_string();
    if detail.len() > 500 {
        detail.truncate(500);
    }
    match code {
        401 | 403 => SynthError::Auth(format!("HTTP {}: {}", code, detail)),
        429 => SynthError::RateLimited(format!("HTTP {}: {}", code, detail)),
        _ => SynthError::Unclassified(format!("HTTP {}: {}", code, detail)),
    }
}

fn map_ureq_error(err: ureq::Error) -> SynthError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(code, &body)
        }
        ureq::Error::Transport(t) => {
            let msg = t.to_string();
            if msg.contains("timed out") || msg.contains("timeout") {
                SynthError::Transport("request timed out".to_string())
            } else {
                SynthError::Transport(msg)
            }
        }
    }
}

/// One parsed server-sent-events line from a streaming completion.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Delta(String),
    Done,
    Ignore,
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Ignore;
    }
    let Some(rest) = line.strip_prefix("data:") else {
        return SseLine::Ignore;
    };
    let payload = rest.trim();
    if payload == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => {
            let delta = value["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or_default();
            if delta.is_empty() {
                SseLine::Ignore
            } else {
                SseLine::Delta(delta.to_string())
            }
        }
        Err(_) => SseLine::Ignore,
    }
}

pub struct OpenAiProvider {
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn agent(read_timeout: Duration) -> ureq::Agent {
        ureq::builder()
            .timeout_connect(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout_read(read_timeout)
            .build()
    }

    fn post_completion(
        &self,
        request: &CompletionRequest,
        api_key: &str,
        stream: bool,
    ) -> Result<ureq::Response, SynthError> {
        validate_key_basic(api_key, self.id())?;
        let url = self.url("chat/completions");
        debug!("POST {} model={} stream={}", url, request.model, stream);
        let agent = Self::agent(Duration::from_secs(READ_TIMEOUT_SECS));
        agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", api_key.trim()))
            .set("Content-Type", "application/json")
            .send_json(ChatRequest::from_request(request, stream))
            .map_err(map_ureq_error)
    }
}

impl AnswerProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    /// Mirrors a model-list call: cheapest request that exercises the
    /// credential and the connection.
    fn preflight(&self, api_key: &str) -> Result<(), SynthError> {
        validate_key_basic(api_key, self.id())?;
        let agent = Self::agent(Duration::from_secs(PREFLIGHT_READ_TIMEOUT_SECS));
        agent
            .get(&self.url("models"))
            .set("Authorization", &format!("Bearer {}", api_key.trim()))
            .call()
            .map(|_| ())
            .map_err(map_ureq_error)
    }

    fn complete(&self, request: &CompletionRequest, api_key: &str) -> Result<String, SynthError> {
        let response = self.post_completion(request, api_key, false)?;
        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| SynthError::Unclassified(format!("Failed to parse response: {}", e)))?;
        let content = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| SynthError::Unclassified("Response has no choices".to_string()))?;
        Ok(content)
    }

    fn complete_streaming(
        &self,
        request: &CompletionRequest,
        api_key: &str,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, SynthError> {
        let response = self.post_completion(request, api_key, true)?;
        let reader = BufReader::new(response.into_reader());
        let mut accumulated = String::new();
        for line in reader.lines() {
            let line =
                line.map_err(|e| SynthError::Transport(format!("Stream read failed: {}", e)))?;
            match parse_sse_line(&line) {
                SseLine::Delta(delta) => {
                    on_delta(&delta);
                    accumulated.push_str(&delta);
                }
                SseLine::Done => break,
                SseLine::Ignore => {}
            }
        }
        Ok(accumulated)
    }
}

/// Serves canned bilingual answers; keeps the full turn loop usable with no
/// network and no credential.
pub struct OfflineProvider;

impl AnswerProvider for OfflineProvider {
    fn id(&self) -> &'static str {
        "offline"
    }

    fn complete(&self, request: &CompletionRequest, _api_key: &str) -> Result<String, SynthError> {
        // The rendered prompt names the markers it expects back.
        let format = if request.user.contains("[KR_SHORT]") {
            AnswerFormat::Triple
        } else {
            AnswerFormat::Dual
        };
        Ok(canned_answer(format).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_known_providers() {
        assert!(ProviderFactory::create("openai", "https://api.openai.com/v1").is_ok());
        assert!(ProviderFactory::create("offline", "").is_ok());
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let err = ProviderFactory::create("other", "").err();
        assert!(matches!(err, Some(SynthError::UnknownProvider(_))));
    }

    #[test]
    fn key_validation_rejects_empty_and_short_keys() {
        assert!(matches!(
            validate_key_basic("", "openai"),
            Err(SynthError::MissingApiKey(_))
        ));
        assert!(matches!(
            validate_key_basic("sk-short", "openai"),
            Err(SynthError::InvalidApiKey(_))
        ));
        assert!(validate_key_basic("sk-proj-abcdefgh12345678", "openai").is_ok());
    }

    #[test]
    fn status_classification_matches_taxonomy() {
        assert!(matches!(classify_status(401, "bad key"), SynthError::Auth(_)));
        assert!(matches!(classify_status(403, ""), SynthError::Auth(_)));
        assert!(matches!(
            classify_status(429, "slow down"),
            SynthError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(500, "oops"),
            SynthError::Unclassified(_)
        ));
    }

    #[test]
    fn status_detail_is_truncated() {
        let long_body = "x".repeat(2000);
        let err = classify_status(500, &long_body);
        let text = err.to_string();
        assert!(text.len() < 600, "detail not truncated: {} chars", text.len());
    }

    #[test]
    fn sse_delta_lines_are_extracted() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Delta("Hel".to_string()));
    }

    #[test]
    fn sse_done_and_noise_lines() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line(""), SseLine::Ignore);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignore);
        assert_eq!(parse_sse_line("event: ping"), SseLine::Ignore);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            SseLine::Ignore
        );
    }

    #[test]
    fn offline_provider_emits_markers_for_requested_format() {
        let provider = OfflineProvider;
        let request = CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.6,
            max_tokens: 800,
            system: String::new(),
            user: "[KR]\n...\n[EN]\n...".to_string(),
        };
        let text = provider.complete(&request, "").unwrap();
        assert!(text.contains("[KR]"));
        assert!(text.contains("[EN]"));

        let request = CompletionRequest {
            user: "[KR_SHORT]\n[KR_LONG]\n[EN]".to_string(),
            ..request
        };
        let text = provider.complete(&request, "").unwrap();
        assert!(text.contains("[KR_SHORT]"));
        assert!(text.contains("[KR_LONG]"));
    }
}
