use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::providers::{Generation, GenerationRequest, SafetyThreshold, TextGenerator},
};

/// Sampling and budget parameters for model calls
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    pub temperature: f32,
    pub repair_temperature: f32,
    pub repair_max_tokens: u32,
    pub base_tokens: u32,
    pub tokens_per_book: u32,
    pub model_max_tokens: u32,
    pub timeout: Duration,
    pub safety: SafetyThreshold,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            repair_temperature: 0.1,
            repair_max_tokens: 2500,
            base_tokens: 500,
            tokens_per_book: 300,
            model_max_tokens: 8000,
            timeout: Duration::from_secs(60),
            safety: SafetyThreshold::default(),
        }
    }
}

/// Text produced by a model, tagged with the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    pub model: String,
}

/// Runs a prompt against an ordered list of models until one yields text
pub struct ModelInvoker {
    generator: Arc<dyn TextGenerator>,
    models: Vec<String>,
    settings: InvokerSettings,
}

impl ModelInvoker {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        models: Vec<String>,
        settings: InvokerSettings,
    ) -> AppResult<Self> {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        if models.is_empty() {
            return Err(AppError::Configuration(
                "At least one model identifier must be configured".to_string(),
            ));
        }

        Ok(Self {
            generator,
            models,
            settings,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Output token budget for a request of `count` books
    pub fn token_budget(&self, count: usize) -> u32 {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.settings
            .base_tokens
            .saturating_add(count.saturating_mul(self.settings.tokens_per_book))
            .min(self.settings.model_max_tokens)
    }

    async fn call(&self, request: &GenerationRequest) -> AppResult<Generation> {
        tokio::time::timeout(self.settings.timeout, self.generator.generate(request))
            .await
            .map_err(|_| {
                AppError::UpstreamUnavailable(format!(
                    "Model {} timed out after {}s",
                    request.model,
                    self.settings.timeout.as_secs()
                ))
            })?
    }

    /// Tries each model in order and returns the first non-empty output
    ///
    /// Fails with `ContentPolicyBlocked` when the last model withheld its
    /// output, otherwise with `UpstreamUnavailable` once the list is exhausted.
    pub async fn invoke(&self, query: &str, prompt: &str, count: usize) -> AppResult<Invocation> {
        let max_output_tokens = self.token_budget(count);
        let mut last_blocked = false;
        let mut last_failure = String::new();

        for model in &self.models {
            let request = GenerationRequest {
                prompt: prompt.to_string(),
                model: model.clone(),
                temperature: self.settings.temperature,
                max_output_tokens,
                safety: self.settings.safety,
            };

            match self.call(&request).await {
                Ok(Generation::Text(text)) if !text.trim().is_empty() => {
                    tracing::info!(
                        model = %model,
                        provider = self.generator.name(),
                        max_output_tokens,
                        "Model produced output"
                    );
                    return Ok(Invocation {
                        text,
                        model: model.clone(),
                    });
                }
                Ok(Generation::Text(_)) => {
                    tracing::warn!(model = %model, "Model returned empty output, trying next");
                    last_blocked = false;
                    last_failure = format!("{} returned empty output", model);
                }
                Ok(Generation::Blocked { reason }) => {
                    tracing::warn!(
                        model = %model,
                        reason = %reason,
                        "Model output blocked, trying next"
                    );
                    last_blocked = true;
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Model call failed, trying next");
                    last_blocked = false;
                    last_failure = e.to_string();
                }
            }
        }

        if last_blocked {
            tracing::warn!(query = %query, "All models blocked the query");
            return Err(AppError::ContentPolicyBlocked(query.to_string()));
        }

        Err(AppError::UpstreamUnavailable(format!(
            "All {} models failed; last error: {}",
            self.models.len(),
            last_failure
        )))
    }

    /// One low-temperature call against `model` to repair malformed output
    pub async fn repair(&self, prompt: &str, model: &str) -> AppResult<String> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: model.to_string(),
            temperature: self.settings.repair_temperature,
            max_output_tokens: self.settings.repair_max_tokens,
            safety: self.settings.safety,
        };

        match self.call(&request).await? {
            Generation::Text(text) if !text.trim().is_empty() => Ok(text),
            Generation::Text(_) => Err(AppError::MalformedResponse(
                "Repair call returned empty output".to_string(),
            )),
            Generation::Blocked { reason } => Err(AppError::MalformedResponse(format!(
                "Repair call was blocked: {}",
                reason
            ))),
        }
    }

    /// Checks that the primary model answers a trivial prompt
    pub async fn probe(&self) -> bool {
        let request = GenerationRequest {
            prompt: "Hello".to_string(),
            model: self.models[0].clone(),
            temperature: self.settings.temperature,
            max_output_tokens: 10,
            safety: self.settings.safety,
        };

        match self.call(&request).await {
            Ok(Generation::Text(text)) => !text.trim().is_empty(),
            Ok(Generation::Blocked { .. }) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Upstream probe failed");
                false
            }
        }
    }
}
