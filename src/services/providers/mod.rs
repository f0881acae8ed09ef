//! Generative-text provider abstraction
//!
//! This module provides a pluggable boundary for the generative model backend
//! (Gemini today). The invoker only sees the [`TextGenerator`] trait, so tests
//! and alternative vendors can be swapped in without touching the pipeline.
use serde::Deserialize;

use crate::error::AppResult;

pub mod gemini;

pub use gemini::GeminiProvider;

/// Content-safety threshold applied to every harm category
///
/// Read from configuration as `BLOCK_NONE`, `BLOCK_ONLY_HIGH` or
/// `BLOCK_MEDIUM_AND_ABOVE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    BlockNone,
    #[default]
    BlockOnlyHigh,
    BlockMediumAndAbove,
}

impl SafetyThreshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyThreshold::BlockNone => "BLOCK_NONE",
            SafetyThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
        }
    }
}

/// One generation call against one model
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub safety: SafetyThreshold,
}

/// Outcome of a generation call that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// Model produced text (possibly empty)
    Text(String),
    /// Output was withheld by the backend's safety filters
    Blocked { reason: String },
}

/// Trait for generative-text backends
///
/// `Err` is reserved for transport-level failures (network, non-success
/// status, undecodable body). A safety block is a successful call that
/// returns [`Generation::Blocked`].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation request
    async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
