//! Deterministic synthetic candidates used to top up a short model response.
//!
//! Nothing here is random: genre and language come from keyword scans of the
//! query, and year and rating come from a stable hash of the generated title.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::hashing::stable_index;
use crate::models::{
    BookType, Candidate, ContentType, Language, ReadingLevel, TargetAudience, Vocabulary,
};

const DESCRIPTORS: [&str; 7] = [
    "Classic",
    "Modern",
    "Bestselling",
    "Acclaimed",
    "Essential",
    "Influential",
    "Timeless",
];

const SYNTHETIC_AUTHOR: &str = "Various Authors";
const FIRST_YEAR: i32 = 2000;
const YEAR_SPAN: usize = 25;

/// Classification attached to a detected genre
#[derive(Debug)]
pub struct GenreProfile {
    pub name: &'static str,
    keywords: &'static [&'static str],
    pub book_type: BookType,
    pub target_audience: TargetAudience,
    pub content_type: ContentType,
}

const fn fiction(name: &'static str, keywords: &'static [&'static str]) -> GenreProfile {
    GenreProfile {
        name,
        keywords,
        book_type: BookType::Fiction,
        target_audience: TargetAudience::General,
        content_type: ContentType::ShortStories,
    }
}

const fn non_fiction(name: &'static str, keywords: &'static [&'static str]) -> GenreProfile {
    GenreProfile {
        name,
        keywords,
        book_type: BookType::NonFiction,
        target_audience: TargetAudience::General,
        content_type: ContentType::Essays,
    }
}

const fn for_audience(profile: GenreProfile, target_audience: TargetAudience) -> GenreProfile {
    GenreProfile {
        target_audience,
        ..profile
    }
}

const fn with_content(profile: GenreProfile, content_type: ContentType) -> GenreProfile {
    GenreProfile {
        content_type,
        ..profile
    }
}

/// Multi-word and more specific genres come before the broad ones they contain
static GENRES: [GenreProfile; 26] = [
    non_fiction(
        "Historical Biography",
        &["historical biography", "freedom", "independence"],
    ),
    fiction("Historical Fiction", &["historical fiction"]),
    fiction("Science Fiction", &["science fiction", "sci-fi"]),
    for_audience(non_fiction("True Crime", &["true crime"]), TargetAudience::Adult),
    for_audience(
        fiction("Young Adult (YA)", &["young adult", "ya"]),
        TargetAudience::YoungAdult,
    ),
    fiction("Graphic Novel", &["graphic novel", "comic book"]),
    with_content(
        non_fiction("Self-Help", &["self-help", "self improvement", "motivation"]),
        ContentType::SelfHelp,
    ),
    non_fiction("Cookbook", &["cookbook", "recipe"]),
    non_fiction("Business/Economics", &["business", "economics", "finance"]),
    for_audience(
        fiction("Children's Literature", &["children's", "kids", "picture book"]),
        TargetAudience::Children,
    ),
    for_audience(
        fiction("Horror", &["horror", "scary", "chilling"]),
        TargetAudience::Adult,
    ),
    fiction("Romance", &["romance", "love story"]),
    fiction("Mystery", &["mystery", "mysteries", "detective"]),
    for_audience(fiction("Crime Fiction", &["crime"]), TargetAudience::Adult),
    for_audience(
        fiction("Thriller/Suspense", &["thriller", "suspense"]),
        TargetAudience::Adult,
    ),
    with_content(fiction("Poetry", &["poetry", "poem", "poems"]), ContentType::Poetry),
    non_fiction("Biography/Memoir", &["biography", "memoir"]),
    non_fiction("History", &["history", "historical"]),
    fiction("Fantasy", &["fantasy", "magic", "dragon"]),
    fiction("Dystopian", &["dystopian", "apocalyptic"]),
    fiction("Adventure", &["adventure", "quest", "journey"]),
    fiction("Comedy/Humor", &["comedy", "humor", "funny"]),
    non_fiction("Philosophy", &["philosophy"]),
    non_fiction("Science (Non-Fiction)", &["science"]),
    fiction("Classic", &["classic", "literature"]),
    non_fiction("Travel", &["travel", "guidebook"]),
];

static GENERAL: GenreProfile = fiction("General", &[]);

static GENRE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    GENRES
        .iter()
        .map(|profile| {
            let alternatives: Vec<String> =
                profile.keywords.iter().map(|k| regex::escape(k)).collect();
            Regex::new(&format!(r"(?i)\b(?:{})s?\b", alternatives.join("|"))).unwrap()
        })
        .collect()
});

/// First genre whose keywords appear in the query, or "General"
pub fn detect_genre(query: &str) -> &'static GenreProfile {
    GENRES
        .iter()
        .zip(GENRE_PATTERNS.iter())
        .find(|(_, pattern)| pattern.is_match(query))
        .map(|(profile, _)| profile)
        .unwrap_or(&GENERAL)
}

/// First language (in vocabulary order) named as a word in the query
pub fn detect_language(query: &str) -> Language {
    let words: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    Language::all()
        .iter()
        .copied()
        .find(|language| words.iter().any(|w| w.eq_ignore_ascii_case(language.as_str())))
        .unwrap_or_default()
}

fn unique_title(base: String, taken: &mut HashSet<String>) -> String {
    let mut title = base.clone();
    let mut edition = 2;
    while taken.contains(&title.to_lowercase()) {
        title = format!("{} (Edition {})", base, edition);
        edition += 1;
    }
    taken.insert(title.to_lowercase());
    title
}

/// Generates `shortage` synthetic candidates for `query`
///
/// `existing_titles` holds the lowercased titles already in the result set.
/// Every generated title is unique against those and against each other.
pub fn augment(query: &str, shortage: usize, existing_titles: &HashSet<String>) -> Vec<Candidate> {
    if shortage == 0 {
        return Vec::new();
    }

    let genre = detect_genre(query);
    let language = detect_language(query);
    let mut taken = existing_titles.clone();

    tracing::info!(
        shortage,
        genre = genre.name,
        language = %language,
        "Generating synthetic recommendations"
    );

    (1..=shortage)
        .map(|slot| {
            let descriptor = DESCRIPTORS[(slot - 1) % DESCRIPTORS.len()];
            let title = unique_title(
                format!("{} {} Collection — Volume {}", descriptor, genre.name, slot),
                &mut taken,
            );

            let year = FIRST_YEAR + stable_index(&title, YEAR_SPAN) as i32;
            let rating = (40 + stable_index(&format!("{}#rating", title), 10)) as f32 / 10.0;

            Candidate {
                author: SYNTHETIC_AUTHOR.to_string(),
                description: Some(format!(
                    "A curated collection of {} works in {} matching your request for '{}'.",
                    genre.name.to_lowercase(),
                    language,
                    query
                )),
                genre: Some(genre.name.to_string()),
                year_published: Some(year),
                rating: Some(rating),
                isbn: None,
                language: Some(language.as_str().to_string()),
                target_audience: Some(genre.target_audience.as_str().to_string()),
                book_type: Some(genre.book_type.as_str().to_string()),
                content_type: Some(genre.content_type.as_str().to_string()),
                reading_level: Some(ReadingLevel::Intermediate.as_str().to_string()),
                title,
            }
        })
        .collect()
}
