//! DeepSeek chat-completion grader (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use examprep_core::error::EvaluationError;
use examprep_core::traits::{CompletionRequest, Grader};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Grader backed by a DeepSeek (or any OpenAI-compatible) endpoint.
pub struct DeepSeekGrader {
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl DeepSeekGrader {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: Option<u64>,
    ) -> anyhow::Result<Self> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl Grader for DeepSeekGrader {
    fn name(&self) -> &str {
        "deepseek"
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, EvaluationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvaluationError::Transport(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    EvaluationError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("grading endpoint returned HTTP {status}: {body}");
            return Err(EvaluationError::Remote { status, body });
        }

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            EvaluationError::InvalidResponse(format!("failed to parse response: {e}"))
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EvaluationError::InvalidResponse("response has no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are an examiner.".into(),
            prompt: "Grade this".into(),
            temperature: 0.5,
            max_tokens: 800,
        }
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "You've earned 3 out of 5 marks.", "role": "assistant"}, "index": 0}],
            "model": "deepseek-chat"
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "temperature": 0.5,
                "max_tokens": 800,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "You are an examiner."},
                    {"role": "user", "content": "Grade this"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let grader = DeepSeekGrader::new("test-key", Some(server.uri()), None, None).unwrap();
        let reply = grader.complete(&request()).await.unwrap();
        assert_eq!(reply, "You've earned 3 out of 5 marks.");
    }

    #[tokio::test]
    async fn error_status_is_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient balance"))
            .mount(&server)
            .await;

        let grader = DeepSeekGrader::new("key", Some(server.uri()), None, None).unwrap();
        let err = grader.complete(&request()).await.unwrap_err();
        match err {
            EvaluationError::Remote { status, body } => {
                assert_eq!(status, 402);
                assert_eq!(body, "insufficient balance");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn model_defaults_and_overrides() {
        let grader = DeepSeekGrader::new("key", None, None, None).unwrap();
        assert_eq!(grader.model(), DEFAULT_MODEL);
        let grader =
            DeepSeekGrader::new("key", None, Some("deepseek-reasoner".into()), None).unwrap();
        assert_eq!(grader.model(), "deepseek-reasoner");
    }

    #[tokio::test]
    async fn unfollowed_redirect_is_remote_error() {
        let server = MockServer::start().await;

        // 300 without a Location header is not followed by the client.
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(300).set_body_string("multiple choices"))
            .mount(&server)
            .await;

        let grader = DeepSeekGrader::new("key", Some(server.uri()), None, None).unwrap();
        let err = grader.complete(&request()).await.unwrap_err();
        assert!(matches!(err, EvaluationError::Remote { status: 300, .. }));
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let grader = DeepSeekGrader::new("key", Some(server.uri()), None, None).unwrap();
        let err = grader.complete(&request()).await.unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let grader = DeepSeekGrader::new("key", Some(server.uri()), None, None).unwrap();
        let err = grader.complete(&request()).await.unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 9 (discard) in the test environment.
        let grader =
            DeepSeekGrader::new("key", Some("http://127.0.0.1:9".into()), None, Some(5)).unwrap();
        let err = grader.complete(&request()).await.unwrap_err();
        assert!(matches!(err, EvaluationError::Transport(_)));
    }
}
