use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::covers::{CoverRequest, CoverSource},
};

const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESULTS: usize = 3;

// ============================================================================
// Google Books API Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    extra_large: Option<String>,
    large: Option<String>,
    medium: Option<String>,
    small: Option<String>,
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

impl ImageLinks {
    /// Largest available image
    fn best(&self) -> Option<&str> {
        [
            &self.extra_large,
            &self.large,
            &self.medium,
            &self.small,
            &self.thumbnail,
            &self.small_thumbnail,
        ]
        .into_iter()
        .find_map(|link| link.as_deref().filter(|url| !url.is_empty()))
    }
}

/// Search queries tried in order, most precise first
pub fn search_queries(title: &str, author: &str) -> Vec<String> {
    let title = title.trim();
    let author = author.trim();

    let mut queries = vec![
        format!("intitle:\"{}\" inauthor:\"{}\"", title, author),
        format!("{} {}", title, author),
    ];

    if title.contains(' ') && author.contains(' ') {
        if let (Some(t0), Some(a0)) = (title.split_whitespace().next(), author.split_whitespace().next()) {
            queries.push(format!("intitle:{} inauthor:{}", t0, a0));
        }
    }

    queries.push(title.to_string());
    queries
}

/// Forces https, drops the page-curl effect and asks for the largest zoom
fn normalize_image_url(url: &str) -> String {
    let url = match url.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => url.to_string(),
    };
    url.replace("&edge=curl", "").replace("zoom=1", "zoom=0")
}

fn select_cover_url(response: &VolumesResponse) -> Option<String> {
    response
        .items
        .iter()
        .take(MAX_RESULTS)
        .find_map(|volume| volume.volume_info.image_links.as_ref()?.best())
        .map(normalize_image_url)
}

/// Google Books volume search
#[derive(Clone)]
pub struct GoogleBooksSource {
    http_client: HttpClient,
    api_url: String,
}

impl GoogleBooksSource {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/volumes?q={}&maxResults={}",
            self.api_url,
            urlencoding::encode(query),
            MAX_RESULTS
        )
    }

    async fn search(&self, query: &str) -> AppResult<VolumesResponse> {
        let response = self.http_client.get(self.search_url(query)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Google Books returned status {}",
                status
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            AppError::ExternalApi(format!("Failed to parse Google Books response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CoverSource for GoogleBooksSource {
    async fn find_cover(&self, request: &CoverRequest) -> AppResult<Option<String>> {
        for query in search_queries(&request.title, &request.author) {
            match self.search(&query).await {
                Ok(response) => {
                    if let Some(url) = select_cover_url(&response) {
                        return Ok(Some(url));
                    }
                }
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "Google Books query failed");
                }
            }
        }

        Ok(None)
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type SeenQueries = Arc<Mutex<Vec<String>>>;

    /// Fails the loose title+author query, answers the first-word query with
    /// a cover and everything else with no items
    async fn volumes(
        State(seen): State<SeenQueries>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let q = params.get("q").cloned().unwrap_or_default();
        seen.lock().unwrap().push(q.clone());

        match q.as_str() {
            "The Hobbit J.R.R. Tolkien" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
            "intitle:The inauthor:J.R.R." => (
                StatusCode::OK,
                Json(json!({"items": [{"volumeInfo": {"imageLinks": {
                    "thumbnail": "http://books.google.com/hobbit?zoom=1"
                }}}]})),
            ),
            _ => (StatusCode::OK, Json(json!({"totalItems": 0}))),
        }
    }

    async fn local_source() -> (GoogleBooksSource, SeenQueries) {
        let seen = SeenQueries::default();
        let router = Router::new()
            .route("/volumes", get(volumes))
            .with_state(seen.clone());
        let source = GoogleBooksSource::new(HttpClient::new(), serve(router).await);
        (source, seen)
    }

    fn request(title: &str, author: &str) -> CoverRequest {
        CoverRequest {
            title: title.to_string(),
            author: author.to_string(),
            isbn: None,
        }
    }

    #[test]
    fn test_search_queries_order() {
        assert_eq!(
            search_queries("The Hobbit", "J.R.R. Tolkien"),
            vec![
                "intitle:\"The Hobbit\" inauthor:\"J.R.R. Tolkien\"",
                "The Hobbit J.R.R. Tolkien",
                "intitle:The inauthor:J.R.R.",
                "The Hobbit",
            ]
        );
    }

    #[test]
    fn test_search_queries_skip_first_word_variant() {
        let queries = search_queries("Dune", "Frank Herbert");
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[2], "Dune");
    }

    #[test]
    fn test_search_url_is_encoded() {
        let source = GoogleBooksSource::new(
            HttpClient::new(),
            "https://www.googleapis.com/books/v1".to_string(),
        );
        assert_eq!(
            source.search_url("intitle:\"Dune\""),
            "https://www.googleapis.com/books/v1/volumes?q=intitle%3A%22Dune%22&maxResults=3"
        );
    }

    #[test]
    fn test_select_prefers_largest_image() {
        let response: VolumesResponse = serde_json::from_str(
            r#"{
                "items": [
                    {"volumeInfo": {"title": "No cover"}},
                    {"volumeInfo": {"imageLinks": {
                        "thumbnail": "http://books.google.com/books/content?id=1&zoom=1&edge=curl",
                        "medium": "http://books.google.com/books/content?id=1&zoom=1&edge=curl&img=m"
                    }}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            select_cover_url(&response).as_deref(),
            Some("https://books.google.com/books/content?id=1&zoom=0&img=m")
        );
    }

    #[test]
    fn test_select_only_considers_first_three_items() {
        let response: VolumesResponse = serde_json::from_str(
            r#"{
                "items": [
                    {"volumeInfo": {}},
                    {"volumeInfo": {}},
                    {"volumeInfo": {}},
                    {"volumeInfo": {"imageLinks": {"thumbnail": "https://x/4.jpg"}}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(select_cover_url(&response), None);
    }

    #[test]
    fn test_select_handles_no_items() {
        let response: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert_eq!(select_cover_url(&response), None);
    }

    #[tokio::test]
    async fn test_looser_queries_only_after_empty_or_failed_ones() {
        let (source, seen) = local_source().await;

        let found = source.find_cover(&request("The Hobbit", "J.R.R. Tolkien")).await.unwrap();

        assert_eq!(found.as_deref(), Some("https://books.google.com/hobbit?zoom=0"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "intitle:\"The Hobbit\" inauthor:\"J.R.R. Tolkien\"",
                "The Hobbit J.R.R. Tolkien",
                "intitle:The inauthor:J.R.R.",
            ]
        );
    }

    #[tokio::test]
    async fn test_exhausted_ladder_is_no_cover() {
        let (source, seen) = local_source().await;

        let found = source.find_cover(&request("Dune", "Frank Herbert")).await.unwrap();

        assert_eq!(found, None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["intitle:\"Dune\" inauthor:\"Frank Herbert\"", "Dune Frank Herbert", "Dune"]
        );
    }
}
