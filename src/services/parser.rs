use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::{
    error::{AppError, AppResult},
    services::{
        invoker::{Invocation, ModelInvoker},
        prompt::build_repair_prompt,
    },
};

static ARRAY_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

type Extraction = fn(&str) -> Option<Vec<Value>>;

/// Strategies applied to fence-stripped text, in order
const EXTRACTIONS: [(&str, Extraction); 2] = [("direct", parse_array), ("bracket", bracket_span)];

fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    for opener in ["```json", "```JSON", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
            break;
        }
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn bracket_span(text: &str) -> Option<Vec<Value>> {
    parse_array(ARRAY_SPAN.find(text)?.as_str())
}

/// Extracts a JSON array from model output without calling the model
pub fn extract_array(raw: &str) -> Option<Vec<Value>> {
    let text = strip_fences(raw);
    EXTRACTIONS.iter().find_map(|(name, extract)| {
        let items = extract(text)?;
        tracing::debug!(strategy = *name, items = items.len(), "Extracted JSON array");
        Some(items)
    })
}

/// Parses model output into candidate-shaped JSON values
///
/// Falls back to a single repair round-trip against the model that produced
/// the text. Never repairs more than once.
pub async fn parse_candidates(
    invoker: &ModelInvoker,
    invocation: &Invocation,
) -> AppResult<Vec<Value>> {
    if let Some(items) = extract_array(&invocation.text) {
        return Ok(items);
    }

    tracing::warn!(
        model = %invocation.model,
        chars = invocation.text.len(),
        "Model output is not valid JSON, attempting repair"
    );

    let repaired = invoker
        .repair(&build_repair_prompt(&invocation.text), &invocation.model)
        .await
        .map_err(|e| AppError::MalformedResponse(format!("Repair failed: {}", e)))?;

    extract_array(&repaired).ok_or_else(|| {
        AppError::MalformedResponse("Model output could not be parsed as a JSON array".to_string())
    })
}
