//! Cover image resolution
//!
//! A cover is looked up through an ordered chain of [`CoverSource`]s, each
//! bounded by its own timeout. The first URL found wins; when every source
//! comes up empty a deterministic placeholder is returned, so resolution never
//! fails.
use futures::stream::{self, StreamExt};
use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{config::Config, error::AppResult, hashing::stable_index};

pub mod google_books;
pub mod open_library;

pub use google_books::GoogleBooksSource;
pub use open_library::OpenLibraryIsbnSource;

const PLACEHOLDER_PALETTE: [&str; 12] = [
    "667eea", "764ba2", "f093fb", "f5576c", "4facfe", "43e97b", "38ef7d", "eea2a2", "bbc1c1",
    "57c6e1", "b721ff", "21d4fd",
];
const PLACEHOLDER_TITLE_CHARS: usize = 20;
const PLACEHOLDER_AUTHOR_CHARS: usize = 15;

/// What is known about a book when looking up its cover
#[derive(Debug, Clone, PartialEq)]
pub struct CoverRequest {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
}

/// Trait for cover image sources
///
/// `Ok(None)` means the source has no cover for this book.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CoverSource: Send + Sync {
    async fn find_cover(&self, request: &CoverRequest) -> AppResult<Option<String>>;

    /// Upper bound on the time spent in `find_cover`
    fn timeout(&self) -> Duration;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Deterministic colored placeholder image
#[derive(Debug, Clone)]
pub struct PlaceholderCover {
    base_url: String,
}

impl PlaceholderCover {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, title: &str, author: &str) -> String {
        let color = PLACEHOLDER_PALETTE
            [stable_index(&title.trim().to_lowercase(), PLACEHOLDER_PALETTE.len())];
        let title: String = title.chars().take(PLACEHOLDER_TITLE_CHARS).collect();
        let author: String = author.chars().take(PLACEHOLDER_AUTHOR_CHARS).collect();

        format!(
            "{}/300x400/{}/ffffff.png?text={}%0A%0A{}",
            self.base_url,
            color,
            urlencoding::encode(&title),
            urlencoding::encode(&author)
        )
    }
}

/// Ordered cover-source chain with a placeholder fallback
pub struct CoverResolver {
    sources: Vec<Box<dyn CoverSource>>,
    placeholder: PlaceholderCover,
}

impl CoverResolver {
    pub fn new(sources: Vec<Box<dyn CoverSource>>, placeholder: PlaceholderCover) -> Self {
        Self {
            sources,
            placeholder,
        }
    }

    /// Open Library by ISBN, then Google Books search, then placeholder
    pub fn from_config(config: &Config) -> Self {
        let http_client = HttpClient::new();
        Self::new(
            vec![
                Box::new(OpenLibraryIsbnSource::new(
                    http_client.clone(),
                    config.open_library_covers_url.clone(),
                )),
                Box::new(GoogleBooksSource::new(
                    http_client,
                    config.google_books_api_url.clone(),
                )),
            ],
            PlaceholderCover::new(config.placeholder_image_url.clone()),
        )
    }

    /// Returns a cover URL for the book; never fails
    pub async fn resolve(&self, request: &CoverRequest) -> String {
        for source in &self.sources {
            match tokio::time::timeout(source.timeout(), source.find_cover(request)).await {
                Ok(Ok(Some(url))) => {
                    tracing::debug!(source = source.name(), title = %request.title, "Cover found");
                    return url;
                }
                Ok(Ok(None)) => {
                    tracing::debug!(source = source.name(), title = %request.title, "No cover");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        source = source.name(),
                        title = %request.title,
                        error = %e,
                        "Cover lookup failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        source = source.name(),
                        title = %request.title,
                        timeout_ms = source.timeout().as_millis() as u64,
                        "Cover lookup timed out"
                    );
                }
            }
        }

        self.placeholder.url(&request.title, &request.author)
    }

    /// Resolves covers for many books, at most `concurrency` at a time
    ///
    /// Output order matches input order.
    pub async fn resolve_all(&self, requests: &[CoverRequest], concurrency: usize) -> Vec<String> {
        let lookups: Vec<_> = requests.iter().map(|request| self.resolve(request)).collect();
        stream::iter(lookups)
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
