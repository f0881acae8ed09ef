//! Closed vocabularies for book classification fields.
//!
//! Every classification attribute on a [`Book`](super::Book) is one of these
//! enums. Raw strings from model output or request filters are mapped onto them
//! with the same lenient matching: case-insensitive exact match first, then a
//! loose match that ignores underscores, spaces and hyphens.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Matches `raw` against `valid`, returning the index of the matching entry.
fn match_index(raw: &str, valid: &[&str]) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(index) = valid.iter().position(|v| v.eq_ignore_ascii_case(trimmed)) {
        return Some(index);
    }

    let loose = loose_key(trimmed);
    valid.iter().position(|v| loose_key(v) == loose)
}

fn loose_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes a raw field value against a set of valid values.
///
/// Returns the canonical spelling from `valid` on a match, otherwise `default`.
/// Never fails.
pub fn normalize_value<'a>(raw: Option<&str>, valid: &[&'a str], default: &'a str) -> &'a str {
    raw.and_then(|r| match_index(r, valid))
        .map(|i| valid[i])
        .unwrap_or(default)
}

/// A closed vocabulary backed by an enum
pub trait Vocabulary: Copy + Default + PartialEq + 'static {
    /// Field name as it appears in requests and model output
    const FIELD: &'static str;

    /// Every value, in catalog order
    fn all() -> &'static [Self];

    /// Canonical string form
    fn as_str(&self) -> &'static str;

    /// Human-readable description for the filter catalog
    fn description(&self) -> &'static str;

    /// Strict lookup: `None` when the value is not in the vocabulary
    fn parse(raw: &str) -> Option<Self> {
        let names: Vec<&str> = Self::all().iter().map(|v| v.as_str()).collect();
        match_index(raw, &names).map(|i| Self::all()[i])
    }

    /// Lenient lookup: falls back to the field default
    fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal, default = $default:ident,
        { $($variant:ident => ($value:literal, $description:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl Vocabulary for $name {
            const FIELD: &'static str = $field;

            fn all() -> &'static [Self] {
                Self::ALL
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            fn description(&self) -> &'static str {
                match self {
                    $($name::$variant => $description,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Primary language of a book
    Language, field = "language", default = English,
    {
        English => ("English", "Books written in English"),
        Spanish => ("Spanish", "Books written in Spanish"),
        French => ("French", "Books written in French"),
        German => ("German", "Books written in German"),
        Italian => ("Italian", "Books written in Italian"),
        Portuguese => ("Portuguese", "Books written in Portuguese"),
        Russian => ("Russian", "Books written in Russian"),
        Japanese => ("Japanese", "Books written in Japanese"),
        Chinese => ("Chinese", "Books written in Chinese"),
        Korean => ("Korean", "Books written in Korean"),
        Arabic => ("Arabic", "Books written in Arabic"),
        Hindi => ("Hindi", "Books written in Hindi"),
        Bengali => ("Bengali", "Books written in Bengali"),
        Tamil => ("Tamil", "Books written in Tamil"),
        Telugu => ("Telugu", "Books written in Telugu"),
        Marathi => ("Marathi", "Books written in Marathi"),
        Gujarati => ("Gujarati", "Books written in Gujarati"),
        Urdu => ("Urdu", "Books written in Urdu"),
        Punjabi => ("Punjabi", "Books written in Punjabi"),
        Sanskrit => ("Sanskrit", "Books written in Sanskrit"),
    }
}

vocabulary! {
    /// Intended readership
    TargetAudience, field = "target_audience", default = General,
    {
        Children => ("children", "Ages 4-12, fun and educational stories"),
        YoungAdult => ("young_adult", "Ages 13-18, coming-of-age themes"),
        Adult => ("adult", "Mature themes, complex narratives"),
        General => ("general", "Suitable for all ages"),
    }
}

vocabulary! {
    /// Broad kind of book
    BookType, field = "book_type", default = Fiction,
    {
        Fiction => ("fiction", "Novels, stories, imaginative narratives"),
        NonFiction => ("non_fiction", "Factual, biographical, informational"),
        Biography => ("biography", "Life stories of real people"),
        Memoir => ("memoir", "Personal life experiences and memories"),
        Textbook => ("textbook", "Educational, academic, learning-focused"),
        Reference => ("reference", "Dictionaries, encyclopedias, guides"),
    }
}

vocabulary! {
    /// Content format
    ContentType, field = "content_type", default = Novel,
    {
        Novel => ("novel", "Full-length fictional narrative"),
        ShortStories => ("short_stories", "Collection of short fictional works"),
        Poetry => ("poetry", "Poetic works and verse collections"),
        Essays => ("essays", "Non-fiction essay collections"),
        Academic => ("academic", "Scholarly, research-based content"),
        SelfHelp => ("self_help", "Personal development and motivation"),
    }
}

vocabulary! {
    /// Reading difficulty
    ReadingLevel, field = "reading_level", default = Intermediate,
    {
        Beginner => ("beginner", "Simple language, easy concepts"),
        Intermediate => ("intermediate", "Moderate complexity, accessible"),
        Advanced => ("advanced", "Complex themes, sophisticated writing"),
        Expert => ("expert", "Highly specialized, academic level"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_total<V: Vocabulary + std::fmt::Debug>() {
        for raw in ["", "   ", "garbage", "12345", "🚀", "fiction-ish", "\n"] {
            let value = V::parse_lenient(Some(raw));
            assert!(V::all().contains(&value), "{:?} not in vocabulary", value);
        }
        assert_eq!(V::parse_lenient(None), V::default());
    }

    fn assert_idempotent<V: Vocabulary + std::fmt::Debug>() {
        for value in V::all() {
            assert_eq!(V::parse_lenient(Some(value.as_str())), *value);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Language::default(), Language::English);
        assert_eq!(TargetAudience::default(), TargetAudience::General);
        assert_eq!(BookType::default(), BookType::Fiction);
        assert_eq!(ContentType::default(), ContentType::Novel);
        assert_eq!(ReadingLevel::default(), ReadingLevel::Intermediate);
    }

    #[test]
    fn test_normalization_is_total() {
        assert_total::<Language>();
        assert_total::<TargetAudience>();
        assert_total::<BookType>();
        assert_total::<ContentType>();
        assert_total::<ReadingLevel>();
    }

    #[test]
    fn test_normalization_is_idempotent() {
        assert_idempotent::<Language>();
        assert_idempotent::<TargetAudience>();
        assert_idempotent::<BookType>();
        assert_idempotent::<ContentType>();
        assert_idempotent::<ReadingLevel>();
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(Language::parse("hindi"), Some(Language::Hindi));
        assert_eq!(Language::parse("  MARATHI "), Some(Language::Marathi));
        assert_eq!(ReadingLevel::parse("Advanced"), Some(ReadingLevel::Advanced));
    }

    #[test]
    fn test_separator_insensitive_match() {
        assert_eq!(BookType::parse("non-fiction"), Some(BookType::NonFiction));
        assert_eq!(BookType::parse("Non Fiction"), Some(BookType::NonFiction));
        assert_eq!(BookType::parse("nonfiction"), Some(BookType::NonFiction));
        assert_eq!(
            TargetAudience::parse("young adult"),
            Some(TargetAudience::YoungAdult)
        );
        assert_eq!(ContentType::parse("self-help"), Some(ContentType::SelfHelp));
        assert_eq!(
            ContentType::parse("short stories"),
            Some(ContentType::ShortStories)
        );
    }

    #[test]
    fn test_unknown_values_fall_back() {
        assert_eq!(Language::parse("Klingon"), None);
        assert_eq!(Language::parse_lenient(Some("Klingon")), Language::English);
        assert_eq!(
            ContentType::parse_lenient(Some("entertainment")),
            ContentType::Novel
        );
        assert_eq!(
            TargetAudience::parse_lenient(Some("teens")),
            TargetAudience::General
        );
    }

    #[test]
    fn test_normalize_value_free_function() {
        let valid = ["fiction", "non_fiction"];
        assert_eq!(normalize_value(Some("NON-FICTION"), &valid, "fiction"), "non_fiction");
        assert_eq!(normalize_value(Some("poetry"), &valid, "fiction"), "fiction");
        assert_eq!(normalize_value(None, &valid, "fiction"), "fiction");
    }

    #[test]
    fn test_serde_uses_canonical_strings() {
        assert_eq!(
            serde_json::to_string(&BookType::NonFiction).unwrap(),
            "\"non_fiction\""
        );
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"Hindi\"");
        let level: ReadingLevel = serde_json::from_str("\"expert\"").unwrap();
        assert_eq!(level, ReadingLevel::Expert);
    }
}
