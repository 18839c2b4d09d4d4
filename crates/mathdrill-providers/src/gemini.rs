//! Google Gemini `generateContent` provider implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mathdrill_core::error::ProviderError;
use mathdrill_core::model::TokenUsage;
use mathdrill_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, ResponseFormat,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs,
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.response_mime_type.is_none()
            && self.temperature.is_none()
            && self.max_output_tokens.is_none()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: GeminiUsage,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiResponse {
    /// `candidates[0].content.parts[0].text`, if every step is present.
    fn first_text(&self) -> Result<&str, ProviderError> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| ProviderError::MalformedResponse("no candidates".into()))?;
        let content = candidate
            .content
            .as_ref()
            .ok_or_else(|| ProviderError::MalformedResponse("candidate has no content".into()))?;
        let part = content
            .parts
            .first()
            .ok_or_else(|| ProviderError::MalformedResponse("content has no parts".into()))?;
        part.text
            .as_deref()
            .ok_or_else(|| ProviderError::MalformedResponse("first part has no text".into()))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some("application/json"),
                    ResponseFormat::Text => None,
                },
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError { status, message }.into());
        }

        let raw = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;
        let api_response: GeminiResponse = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::MalformedResponse(format!("failed to parse response: {e}"))
        })?;
        let content = api_response.first_text()?.to_string();

        let latency_ms = start.elapsed().as_millis() as u64;
        let usage = &api_response.usage_metadata;
        let total_tokens = if usage.total_token_count > 0 {
            usage.total_token_count
        } else {
            usage.prompt_token_count + usage.candidates_token_count
        };

        Ok(GenerateResponse {
            content,
            model: api_response
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            token_usage: TokenUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens,
            },
            latency_ms,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "gemini-2.0-flash".into(),
                name: "Gemini 2.0 Flash".into(),
                provider: "gemini".into(),
                max_context: 1_048_576,
            },
            ModelInfo {
                id: "gemini-2.0-flash-lite".into(),
                name: "Gemini 2.0 Flash-Lite".into(),
                provider: "gemini".into(),
                max_context: 1_048_576,
            },
            ModelInfo {
                id: "gemini-2.5-flash".into(),
                name: "Gemini 2.5 Flash".into(),
                provider: "gemini".into(),
                max_context: 1_048_576,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new("test-key", Some(server.uri()), 10).unwrap()
    }

    fn text_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 40,
                "candidatesTokenCount": 12,
                "totalTokenCount": 52
            },
            "modelVersion": "gemini-2.0-flash"
        })
    }

    async fn mount(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Give me a problem"}]}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(text_reply("What is 12 x 12?")),
            )
            .mount(&server)
            .await;

        let request = GenerateRequest::new("gemini-2.0-flash", "Give me a problem");
        let response = provider(&server).generate(&request).await.unwrap();

        assert_eq!(response.content, "What is 12 x 12?");
        assert_eq!(response.model, "gemini-2.0-flash");
        assert_eq!(response.token_usage.prompt_tokens, 40);
        assert_eq!(response.token_usage.completion_tokens, 12);
        assert_eq!(response.token_usage.total_tokens, 52);
    }

    #[tokio::test]
    async fn json_format_sets_mime_type() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_reply(r#"{"isCorrect": true, "explanation": "ok"}"#)),
            )
            .mount(&server)
            .await;

        let request = GenerateRequest::new("gemini-2.0-flash", "grade").json();
        let response = provider(&server).generate(&request).await.unwrap();
        assert!(response.content.contains("isCorrect"));
    }

    #[tokio::test]
    async fn missing_candidates_is_malformed() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn missing_parts_is_malformed() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model"}}]
            })),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content has no parts"));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        let err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(403).set_body_string("API key not valid"),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(429).insert_header("retry-after", "7"),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProviderError>()
                .and_then(|e| e.retry_after_ms()),
            Some(7000)
        );
    }

    #[tokio::test]
    async fn server_error_message_extracted() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"code": 500, "message": "Internal error encountered.", "status": "INTERNAL"}
            })),
        )
        .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (HTTP 500): Internal error encountered."
        );
    }

    #[tokio::test]
    async fn unknown_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&GenerateRequest::new("gemini-9", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model not found: gemini-9"));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let provider =
            GeminiProvider::new("test-key", Some("http://127.0.0.1:1".into()), 5).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("gemini-2.0-flash", "p"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ProviderError>().unwrap().is_transport());
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            GeminiProvider::new("k", Some("http://localhost:8080/".into()), 5).unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.0-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
