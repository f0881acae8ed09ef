use serde::Serialize;

use crate::models::{
    BookType, ContentType, Language, ReadingLevel, TargetAudience, Vocabulary,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterOption {
    pub value: &'static str,
    pub description: &'static str,
}

/// Every filter field with its allowed values
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterCatalog {
    pub language: Vec<FilterOption>,
    pub target_audience: Vec<FilterOption>,
    pub book_type: Vec<FilterOption>,
    pub content_type: Vec<FilterOption>,
    pub reading_level: Vec<FilterOption>,
}

fn options<V: Vocabulary>() -> Vec<FilterOption> {
    V::all()
        .iter()
        .map(|v| FilterOption {
            value: v.as_str(),
            description: v.description(),
        })
        .collect()
}

pub fn get_available_filters() -> FilterCatalog {
    FilterCatalog {
        language: options::<Language>(),
        target_audience: options::<TargetAudience>(),
        book_type: options::<BookType>(),
        content_type: options::<ContentType>(),
        reading_level: options::<ReadingLevel>(),
    }
}
