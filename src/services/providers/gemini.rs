//! Google Gemini provider
//!
//! Calls the Generative Language REST API directly:
//! `POST {api_url}/models/{model}:generateContent`
//!
//! A response counts as withheld when the prompt itself was blocked
//! (`promptFeedback.blockReason`) or when the first candidate carries no text
//! and finished for a safety-class reason.
use crate::{
    error::{AppError, AppResult},
    services::providers::{Generation, GenerationRequest, SafetyThreshold, TextGenerator},
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const SAFETY_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart {
                text: &request.prompt,
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            candidate_count: 1,
        },
        safety_settings: safety_settings(request.safety),
    }
}

fn safety_settings(threshold: SafetyThreshold) -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|&category| SafetySetting {
            category,
            threshold: threshold.as_str(),
        })
        .collect()
}

/// Converts a decoded response into a [`Generation`]
fn interpret_response(response: GenerateContentResponse) -> Generation {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Generation::Blocked { reason };
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Generation::Text(String::new());
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| SAFETY_FINISH_REASONS.contains(&r.as_str()))
        {
            return Generation::Blocked { reason };
        }
    }

    Generation::Text(text)
}

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_url, model)
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation> {
        let url = self.endpoint(&request.model);

        tracing::debug!(
            model = %request.model,
            max_output_tokens = request.max_output_tokens,
            "Calling Gemini generateContent"
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;

        let decoded: GenerateContentResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %request.model,
                    "Failed to deserialize Gemini response"
                );
                AppError::ExternalApi(format!("Failed to parse Gemini response: {}", e))
            })?;

        let generation = interpret_response(decoded);

        match &generation {
            Generation::Text(text) => tracing::info!(
                model = %request.model,
                chars = text.len(),
                provider = "gemini",
                "Generation completed"
            ),
            Generation::Blocked { reason } => tracing::warn!(
                model = %request.model,
                reason = %reason,
                provider = "gemini",
                "Generation withheld by safety filter"
            ),
        }

        Ok(generation)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::Value;

    /// `overloaded` models answer 503, `garbled` models answer non-JSON, the
    /// rest echo the maxOutputTokens they were sent
    async fn generate_content(
        Path(action): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (StatusCode::UNAUTHORIZED, "missing key".to_string());
        }
        let Some(model) = action.strip_suffix(":generateContent") else {
            return (StatusCode::NOT_FOUND, String::new());
        };
        match model {
            "overloaded" => (StatusCode::SERVICE_UNAVAILABLE, "model overloaded".to_string()),
            "garbled" => (StatusCode::OK, "<html>".to_string()),
            _ => {
                let budget = &body["generationConfig"]["maxOutputTokens"];
                let reply = serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": format!("budget {}", budget)}]}}]
                });
                (StatusCode::OK, reply.to_string())
            }
        }
    }

    async fn local_provider() -> GeminiProvider {
        let router = Router::new().route("/models/:action", post(generate_content));
        GeminiProvider::new("test-key".to_string(), serve(router).await)
    }

    fn request_for(model: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: "Recommend books".to_string(),
            model: model.to_string(),
            temperature: 0.7,
            max_output_tokens: 800,
            safety: SafetyThreshold::BlockOnlyHigh,
        }
    }

    fn decode(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_endpoint_format() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            "https://generativelanguage.googleapis.com/v1beta/".to_string(),
        );
        assert_eq!(
            provider.endpoint("gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_serialization() {
        let request = GenerationRequest {
            prompt: "Recommend books".to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 2000,
            safety: SafetyThreshold::BlockOnlyHigh,
        };
        let body = serde_json::to_value(build_request_body(&request)).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Recommend books");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
        assert_eq!(body["generationConfig"]["candidateCount"], 1);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn test_interpret_text_response() {
        let response = decode(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "[{\"title\": "}, {"text": "\"Dune\"}]"}]},
                    "finishReason": "STOP"
                }]
            }"#,
        );
        assert_eq!(
            interpret_response(response),
            Generation::Text(r#"[{"title": "Dune"}]"#.to_string())
        );
    }

    #[test]
    fn test_interpret_prompt_block() {
        let response = decode(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(
            interpret_response(response),
            Generation::Blocked {
                reason: "SAFETY".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_candidate_safety_finish() {
        let response = decode(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(
            interpret_response(response),
            Generation::Blocked { .. }
        ));
    }

    #[test]
    fn test_interpret_text_wins_over_finish_reason() {
        let response = decode(
            r#"{"candidates": [{"content": {"parts": [{"text": "[]"}]}, "finishReason": "SAFETY"}]}"#,
        );
        assert_eq!(interpret_response(response), Generation::Text("[]".to_string()));
    }

    #[test]
    fn test_interpret_empty_response() {
        let response = decode("{}");
        assert_eq!(interpret_response(response), Generation::Text(String::new()));
    }

    #[tokio::test]
    async fn test_generate_against_local_server() {
        let provider = local_provider().await;

        let generation = provider.generate(&request_for("gemini-1.5-flash")).await.unwrap();
        assert_eq!(generation, Generation::Text("budget 800".to_string()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_external_api_error() {
        let provider = local_provider().await;

        let err = provider.generate(&request_for("overloaded")).await.unwrap_err();
        match err {
            AppError::ExternalApi(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("model overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_external_api_error() {
        let provider = local_provider().await;

        let err = provider.generate(&request_for("garbled")).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
