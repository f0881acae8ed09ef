use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{Fingerprint, QueryCache},
    cached,
    config::Config,
    error::{AppError, AppResult},
    models::{Book, Candidate, Filters, RecommendationQuery, RecommendationResult},
    services::{
        augmenter::augment,
        covers::{CoverRequest, CoverResolver},
        invoker::{InvokerSettings, ModelInvoker},
        parser::parse_candidates,
        prompt::build_prompt,
        providers::GeminiProvider,
    },
};

/// Count used by the quick recommendations endpoint
pub const QUICK_COUNT: i64 = 5;

/// Bounds for the query-string search endpoint
pub const SEARCH_MIN_QUERY_CHARS: usize = 3;
pub const SEARCH_DEFAULT_LIMIT: i64 = 5;
pub const SEARCH_MAX_LIMIT: i64 = 10;

/// Generates exact-size, normalized, cover-resolved recommendation sets
///
/// Flow on a cache miss: prompt, invoke, parse, drop malformed candidates,
/// top up with synthetic candidates, truncate, then normalize and resolve a
/// cover for each book. Only complete results are cached.
pub struct RecommendationPipeline {
    invoker: ModelInvoker,
    covers: CoverResolver,
    cache: Arc<QueryCache>,
    cover_concurrency: usize,
}

impl RecommendationPipeline {
    pub fn new(
        invoker: ModelInvoker,
        covers: CoverResolver,
        cache: Arc<QueryCache>,
        cover_concurrency: usize,
    ) -> Self {
        Self {
            invoker,
            covers,
            cache,
            cover_concurrency: cover_concurrency.max(1),
        }
    }

    /// Wires the Gemini backend, the standard cover chain and the cache
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config.require_api_key()?;

        let generator = Arc::new(GeminiProvider::new(
            api_key.to_string(),
            config.gemini_api_url.clone(),
        ));
        let settings = InvokerSettings {
            timeout: Duration::from_secs(config.model_timeout_secs),
            safety: config.gemini_safety_threshold,
            ..Default::default()
        };
        let invoker = ModelInvoker::new(generator, config.gemini_models.clone(), settings)?;

        let cache = Arc::new(QueryCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity,
        ));

        tracing::info!(
            models = ?invoker.models(),
            safety = config.gemini_safety_threshold.as_str(),
            cache_ttl_secs = config.cache_ttl_secs,
            cache_capacity = config.cache_capacity,
            cover_concurrency = config.cover_concurrency,
            "Recommendation pipeline configured"
        );

        Ok(Self::new(
            invoker,
            CoverResolver::from_config(config),
            cache,
            config.cover_concurrency,
        ))
    }

    /// Returns exactly `clamp(requested_count)` books for the query
    pub async fn generate_recommendations(
        &self,
        query_text: &str,
        requested_count: Option<i64>,
        filters: &Filters,
    ) -> AppResult<RecommendationResult> {
        let query = RecommendationQuery::new(query_text, requested_count, filters)?;
        let fingerprint = Fingerprint::of(&query);

        tracing::info!(
            query = %query.text,
            requested_count = query.requested_count,
            filters = ?query.filters.constraints(),
            "Generating recommendations"
        );

        cached!(self.cache, fingerprint, self.assemble(&query))
    }

    /// Five recommendations, sharing the cache with the full endpoint
    pub async fn quick_recommendations(
        &self,
        query_text: &str,
        filters: &Filters,
    ) -> AppResult<RecommendationResult> {
        self.generate_recommendations(query_text, Some(QUICK_COUNT), filters)
            .await
    }

    /// Short unfiltered search: at least three characters, 1 to 10 books
    ///
    /// Unlike the main entry point, an out-of-range limit is rejected rather
    /// than clamped.
    pub async fn search_recommendations(
        &self,
        query_text: &str,
        limit: Option<i64>,
    ) -> AppResult<RecommendationResult> {
        if query_text.trim().chars().count() < SEARCH_MIN_QUERY_CHARS {
            return Err(AppError::InvalidInput(format!(
                "Search query must be at least {} characters",
                SEARCH_MIN_QUERY_CHARS
            )));
        }

        let limit = limit.unwrap_or(SEARCH_DEFAULT_LIMIT);
        if !(1..=SEARCH_MAX_LIMIT).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                SEARCH_MAX_LIMIT
            )));
        }

        self.generate_recommendations(query_text, Some(limit), &Filters::default())
            .await
    }

    /// Whether the primary model currently answers
    pub async fn probe_upstream(&self) -> bool {
        self.invoker.probe().await
    }

    async fn assemble(&self, query: &RecommendationQuery) -> AppResult<RecommendationResult> {
        let target = query.requested_count;

        let prompt = build_prompt(&query.text, target, &query.filters);
        let invocation = self.invoker.invoke(&query.text, &prompt, target).await?;
        let raw = parse_candidates(&self.invoker, &invocation).await?;

        let mut candidates: Vec<Candidate> = Vec::with_capacity(target);
        for (index, value) in raw.iter().enumerate() {
            match Candidate::try_from(value) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => tracing::warn!(index, error = %e, "Dropping malformed candidate"),
            }
        }

        tracing::info!(
            model = %invocation.model,
            parsed = raw.len(),
            valid = candidates.len(),
            requested = target,
            "Parsed model candidates"
        );

        if candidates.len() < target {
            let existing: HashSet<String> =
                candidates.iter().map(|c| c.title.to_lowercase()).collect();
            let shortage = target - candidates.len();
            candidates.extend(augment(&query.text, shortage, &existing));
        }
        candidates.truncate(target);

        if candidates.is_empty() {
            return Err(AppError::NoValidRecommendations(query.text.clone()));
        }

        let requests: Vec<CoverRequest> = candidates
            .iter()
            .map(|c| CoverRequest {
                title: c.title.clone(),
                author: c.author.clone(),
                isbn: c.isbn.clone(),
            })
            .collect();
        let covers = self
            .covers
            .resolve_all(&requests, self.cover_concurrency)
            .await;

        let books: Vec<Book> = candidates
            .into_iter()
            .zip(covers)
            .map(|(candidate, cover)| Book::from_candidate(candidate, cover))
            .collect();

        tracing::info!(
            query = %query.text,
            total = books.len(),
            "Recommendations assembled"
        );

        Ok(RecommendationResult::new(query.text.clone(), books))
    }
}
