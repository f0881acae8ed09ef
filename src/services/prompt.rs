use std::fmt::Write;

use crate::models::{
    ActiveFilters, BookType, ContentType, Language, ReadingLevel, TargetAudience, Vocabulary,
};

/// Upper bound on how much malformed output is echoed back for repair
const REPAIR_EXCERPT_CHARS: usize = 1000;

fn vocabulary_line<V: Vocabulary>() -> String {
    let values: Vec<&str> = V::all().iter().map(|v| v.as_str()).collect();
    format!("- {}: {}", V::FIELD, values.join(", "))
}

/// Builds the generation prompt for a query
///
/// The output depends only on its arguments. The allowed values listed in the
/// prompt come straight from the vocabulary enums.
pub fn build_prompt(query: &str, count: usize, filters: &ActiveFilters) -> String {
    let mut prompt = String::with_capacity(2048);

    let _ = writeln!(
        prompt,
        "You are an expert librarian. Recommend exactly {} books for this request: \"{}\"",
        count, query
    );

    let constraints = filters.constraints();
    if !constraints.is_empty() {
        prompt.push_str("\nREQUIRED FILTERS (every book must match all of these):\n");
        for (field, value) in constraints {
            let _ = writeln!(prompt, "- {}: {}", field, value);
        }
    }

    let _ = writeln!(
        prompt,
        "\nReturn a JSON array containing exactly {} objects. Each object has these fields:",
        count
    );
    prompt.push_str(
        "- \"title\": string\n\
         - \"author\": string\n\
         - \"description\": string, two or three sentences\n\
         - \"genre\": string\n\
         - \"year_published\": integer\n\
         - \"rating\": number between 0.0 and 5.0\n\
         - \"isbn\": ISBN-10 or ISBN-13 string, if known\n\
         - \"language\", \"target_audience\", \"book_type\", \"content_type\", \"reading_level\": \
         one of the allowed values below\n",
    );

    prompt.push_str("\nAllowed values:\n");
    for line in [
        vocabulary_line::<Language>(),
        vocabulary_line::<TargetAudience>(),
        vocabulary_line::<BookType>(),
        vocabulary_line::<ContentType>(),
        vocabulary_line::<ReadingLevel>(),
    ] {
        prompt.push_str(&line);
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "\nRules:\n\
         - The array must contain exactly {} books, no more and no fewer.\n\
         - Recommend real, published books only.\n\
         - Respond with the JSON array only. No prose, no markdown, no code fences.\n",
        count
    );

    prompt
}

/// Builds the one-shot repair instruction for malformed model output
pub fn build_repair_prompt(malformed: &str) -> String {
    let excerpt: String = malformed.chars().take(REPAIR_EXCERPT_CHARS).collect();
    format!(
        "Fix this malformed JSON and return ONLY valid JSON array with no extra text:\n{}",
        excerpt
    )
}
