use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

pub mod vocabulary;

pub use vocabulary::{
    normalize_value, BookType, ContentType, Language, ReadingLevel, TargetAudience, Vocabulary,
};

/// Number of books returned when the caller does not ask for a count
pub const DEFAULT_REQUESTED_COUNT: usize = 20;

/// Hard upper bound on books per request
pub const MAX_REQUESTED_COUNT: usize = 150;

/// Clamps a requested count into `[1, MAX_REQUESTED_COUNT]`
pub fn clamp_requested_count(count: Option<i64>) -> usize {
    match count {
        None => DEFAULT_REQUESTED_COUNT,
        Some(n) => n.clamp(1, MAX_REQUESTED_COUNT as i64) as usize,
    }
}

// ============================================================================
// Query & Filters
// ============================================================================

/// Raw filter values as supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Filters {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "age_group")]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub book_type: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub reading_level: Option<String>,
}

/// Filters resolved against the closed vocabularies; `None` means unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActiveFilters {
    pub language: Option<Language>,
    pub target_audience: Option<TargetAudience>,
    pub book_type: Option<BookType>,
    pub content_type: Option<ContentType>,
    pub reading_level: Option<ReadingLevel>,
}

fn is_unconstrained(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("any")
}

fn resolve_filter<V: Vocabulary>(raw: Option<&str>) -> AppResult<Option<V>> {
    match raw {
        None => Ok(None),
        Some(raw) if is_unconstrained(raw) => Ok(None),
        Some(raw) => V::parse(raw).map(Some).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown {} filter: '{}'", V::FIELD, raw.trim()))
        }),
    }
}

impl ActiveFilters {
    /// Validates raw filters, treating "none"/"any" as absent
    pub fn resolve(filters: &Filters) -> AppResult<Self> {
        Ok(Self {
            language: resolve_filter(filters.language.as_deref())?,
            target_audience: resolve_filter(filters.target_audience.as_deref())?,
            book_type: resolve_filter(filters.book_type.as_deref())?,
            content_type: resolve_filter(filters.content_type.as_deref())?,
            reading_level: resolve_filter(filters.reading_level.as_deref())?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Canonical `(field, value)` pairs for every active filter
    pub fn constraints(&self) -> Vec<(&'static str, &'static str)> {
        let mut constraints = Vec::new();
        if let Some(v) = self.language {
            constraints.push((Language::FIELD, v.as_str()));
        }
        if let Some(v) = self.target_audience {
            constraints.push((TargetAudience::FIELD, v.as_str()));
        }
        if let Some(v) = self.book_type {
            constraints.push((BookType::FIELD, v.as_str()));
        }
        if let Some(v) = self.content_type {
            constraints.push((ContentType::FIELD, v.as_str()));
        }
        if let Some(v) = self.reading_level {
            constraints.push((ReadingLevel::FIELD, v.as_str()));
        }
        constraints
    }
}

/// A validated recommendation query
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub text: String,
    pub requested_count: usize,
    pub filters: ActiveFilters,
}

impl RecommendationQuery {
    /// Validates the query text and filters and clamps the count
    pub fn new(text: &str, requested_count: Option<i64>, filters: &Filters) -> AppResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            text: trimmed.to_string(),
            requested_count: clamp_requested_count(requested_count),
            filters: ActiveFilters::resolve(filters)?,
        })
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// Why a candidate record was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CandidateError {
    #[error("candidate is not a JSON object")]
    NotAnObject,
    #[error("candidate is missing a title")]
    MissingTitle,
    #[error("candidate '{0}' is missing an author")]
    MissingAuthor(String),
}

/// An unvalidated book record from model output or synthetic augmentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub year_published: Option<i32>,
    pub rating: Option<f32>,
    pub isbn: Option<String>,
    pub language: Option<String>,
    pub target_audience: Option<String>,
    pub book_type: Option<String>,
    pub content_type: Option<String>,
    pub reading_level: Option<String>,
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    })
}

fn int_field(map: &Map<String, Value>, keys: &[&str]) -> Option<i32> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn float_field(map: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl TryFrom<&Value> for Candidate {
    type Error = CandidateError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let map = value.as_object().ok_or(CandidateError::NotAnObject)?;

        let title = text_field(map, &["title"]).ok_or(CandidateError::MissingTitle)?;
        let author = text_field(map, &["author", "authors"])
            .ok_or_else(|| CandidateError::MissingAuthor(title.clone()))?;

        Ok(Candidate {
            title,
            author,
            description: text_field(map, &["description", "short_description", "brief_summary"]),
            genre: text_field(map, &["genre"]),
            year_published: int_field(map, &["year_published", "publication_year"]),
            rating: float_field(map, &["rating"]),
            isbn: text_field(map, &["isbn"]),
            language: text_field(map, &["language"]),
            target_audience: text_field(map, &["target_audience", "age_group"]),
            book_type: text_field(map, &["book_type"]),
            content_type: text_field(map, &["content_type"]),
            reading_level: text_field(map, &["reading_level"]),
        })
    }
}

// ============================================================================
// Books & Results
// ============================================================================

/// A final, normalized book recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: String,
    pub year_published: Option<i32>,
    pub rating: Option<f32>,
    pub cover_image_url: String,
    pub language: Language,
    pub target_audience: TargetAudience,
    pub book_type: BookType,
    pub content_type: ContentType,
    pub reading_level: ReadingLevel,
}

impl Book {
    /// Builds a book from a candidate, normalizing every classification field
    pub fn from_candidate(candidate: Candidate, cover_image_url: String) -> Self {
        Self {
            language: Language::parse_lenient(candidate.language.as_deref()),
            target_audience: TargetAudience::parse_lenient(candidate.target_audience.as_deref()),
            book_type: BookType::parse_lenient(candidate.book_type.as_deref()),
            content_type: ContentType::parse_lenient(candidate.content_type.as_deref()),
            reading_level: ReadingLevel::parse_lenient(candidate.reading_level.as_deref()),
            description: candidate.description.unwrap_or_default(),
            genre: candidate.genre.unwrap_or_else(|| "General".to_string()),
            year_published: candidate.year_published,
            rating: candidate.rating.filter(|r| (0.0..=5.0).contains(r)),
            title: candidate.title,
            author: candidate.author,
            cover_image_url,
        }
    }
}

/// An exact-size set of recommendations for one query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub query: String,
    pub recommendations: Vec<Book>,
    pub generated_at: DateTime<Utc>,
    pub total_count: usize,
}

impl RecommendationResult {
    pub fn new(query: String, recommendations: Vec<Book>) -> Self {
        Self {
            total_count: recommendations.len(),
            query,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}
