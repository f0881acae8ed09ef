use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{
    error::AppResult,
    services::covers::{CoverRequest, CoverSource},
};

const TIMEOUT: Duration = Duration::from_secs(3);

/// Reduces an ISBN-like string to its digits (and a trailing check `X`)
///
/// Returns `None` unless exactly 10 or 13 characters remain.
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'x' | 'X'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let check_digit_only_last = cleaned
        .char_indices()
        .all(|(i, c)| c != 'X' || i == cleaned.len() - 1);

    match cleaned.len() {
        10 | 13 if check_digit_only_last => Some(cleaned),
        _ => None,
    }
}

/// Open Library covers looked up by ISBN
#[derive(Clone)]
pub struct OpenLibraryIsbnSource {
    http_client: HttpClient,
    covers_url: String,
}

impl OpenLibraryIsbnSource {
    pub fn new(http_client: HttpClient, covers_url: String) -> Self {
        Self {
            http_client,
            covers_url: covers_url.trim_end_matches('/').to_string(),
        }
    }

    fn cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{}-L.jpg", self.covers_url, isbn)
    }
}

#[async_trait::async_trait]
impl CoverSource for OpenLibraryIsbnSource {
    async fn find_cover(&self, request: &CoverRequest) -> AppResult<Option<String>> {
        let Some(isbn) = request.isbn.as_deref().and_then(normalize_isbn) else {
            return Ok(None);
        };

        let url = self.cover_url(&isbn);

        // default=false turns a missing cover into a 404 instead of a blank image
        let response = self
            .http_client
            .head(format!("{}?default=false", url))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(Some(url))
        } else {
            tracing::debug!(isbn = %isbn, status = %response.status(), "No Open Library cover");
            Ok(None)
        }
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn name(&self) -> &'static str {
        "open_library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
        Router,
    };
    use std::collections::HashMap;

    const KNOWN_ISBN: &str = "9780140449136";

    /// Only the known ISBN has a cover, and only with `default=false`
    async fn cover(
        Path(file): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> StatusCode {
        let no_default = params.get("default").map(String::as_str) == Some("false");
        if no_default && file == format!("{}-L.jpg", KNOWN_ISBN) {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn local_source() -> (OpenLibraryIsbnSource, String) {
        let router = Router::new().route("/b/isbn/:file", get(cover));
        let base = serve(router).await;
        (OpenLibraryIsbnSource::new(HttpClient::new(), base.clone()), base)
    }

    fn with_isbn(isbn: &str) -> CoverRequest {
        CoverRequest {
            title: "The Odyssey".to_string(),
            author: "Homer".to_string(),
            isbn: Some(isbn.to_string()),
        }
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-0-14-044913-6").as_deref(), Some("9780140449136"));
        assert_eq!(normalize_isbn("0-8044-2957-x").as_deref(), Some("080442957X"));
        assert_eq!(normalize_isbn("ISBN 0140449132").as_deref(), Some("0140449132"));
    }

    #[test]
    fn test_normalize_isbn_rejects_bad_lengths() {
        assert_eq!(normalize_isbn("12345"), None);
        assert_eq!(normalize_isbn("unknown"), None);
        assert_eq!(normalize_isbn(""), None);
        assert_eq!(normalize_isbn("X123456789"), None);
    }

    #[test]
    fn test_cover_url() {
        let source =
            OpenLibraryIsbnSource::new(HttpClient::new(), "https://covers.openlibrary.org/".to_string());
        assert_eq!(
            source.cover_url("9780140449136"),
            "https://covers.openlibrary.org/b/isbn/9780140449136-L.jpg"
        );
    }

    #[tokio::test]
    async fn test_missing_isbn_skips_network() {
        // Unroutable base URL: any request would fail
        let source = OpenLibraryIsbnSource::new(HttpClient::new(), "http://127.0.0.1:9".to_string());
        let request = CoverRequest {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("n/a".to_string()),
        };
        let found = tokio_test::assert_ok!(source.find_cover(&request).await);
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_success_status_yields_cover_url() {
        let (source, base) = local_source().await;

        let found = source.find_cover(&with_isbn("978-0-14-044913-6")).await.unwrap();
        assert_eq!(found, Some(format!("{}/b/isbn/{}-L.jpg", base, KNOWN_ISBN)));
    }

    #[tokio::test]
    async fn test_not_found_is_no_cover() {
        let (source, _) = local_source().await;

        let found = source.find_cover(&with_isbn("0140449132")).await.unwrap();
        assert_eq!(found, None);
    }
}
