//! Display formatting for parsed BibTeX fields.
//!
//! Turns raw field values into the title, author, journal and date lines
//! shown in the article summary.

use crate::models::BibFields;

/// Remove every literal `{}` pair left over from BibTeX case protection.
pub fn strip_empty_braces(text: &str) -> String {
    text.replace("{}", "")
}

/// Format a BibTeX author list as "First Last, First Last".
///
/// Authors are separated by `" and "`. Segments in "Last, First" form are
/// flipped around the first comma; segments without a comma are kept as is.
pub fn format_authors(authors: &str) -> String {
    if authors.is_empty() {
        return String::new();
    }

    strip_empty_braces(authors)
        .split(" and ")
        .map(format_author_single)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_author_single(author: &str) -> String {
    let author = author.trim();
    match author.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => author.to_string(),
    }
}

/// Journal name followed by volume, number and pages clauses when present.
pub fn format_journal(fields: &BibFields) -> String {
    if fields.journal.is_empty() {
        return String::new();
    }

    let mut line = strip_empty_braces(&fields.journal);
    if !fields.volume.is_empty() {
        line.push_str(&format!(", vol. {}", fields.volume));
    }
    if !fields.number.is_empty() {
        line.push_str(&format!(", no. {}", fields.number));
    }
    if !fields.pages.is_empty() {
        line.push_str(&format!(", pp. {}", fields.pages));
    }
    line
}

/// "Month Year", omitting whichever part is missing.
pub fn format_date(month: &str, year: &str) -> String {
    [month, year]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
