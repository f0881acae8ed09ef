use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "Unable to generate recommendations for '{0}'. This query triggers content safety filters. \
         Try alternative search terms like 'thriller', 'mystery', or 'suspense'."
    )]
    ContentPolicyBlocked(String),

    #[error("Upstream model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("No valid book recommendations could be generated for '{0}'")]
    NoValidRecommendations(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) | AppError::ContentPolicyBlocked(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::HttpClient(_) | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_)
            | AppError::MalformedResponse(_)
            | AppError::NoValidRecommendations(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
