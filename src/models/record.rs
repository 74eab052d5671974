//! Parsed BibTeX fields and the display summary built from them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::utils::cite;

/// Field names picked out of a BibTeX record. Everything else is ignored.
pub const KNOWN_FIELDS: [&str; 8] = [
    "title", "author", "journal", "year", "month", "volume", "number", "pages",
];

/// `key = {value}` or `key = "value"`. Values stop at the first closing delimiter.
const FIELD_PATTERN: &str = r#"(\w+)\s*=\s*(?:\{([^}]*)\}|"([^"]*)")"#;

static FIELD_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn field_regex() -> Option<&'static Regex> {
    FIELD_REGEX.get_or_init(|| Regex::new(FIELD_PATTERN).ok()).as_ref()
}

/// The fixed set of fields read from a BibTeX record, empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibFields {
    pub title: String,
    pub author: String,
    pub journal: String,
    pub year: String,
    pub month: String,
    pub volume: String,
    pub number: String,
    pub pages: String,
}

impl BibFields {
    fn slot_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "title" => Some(&mut self.title),
            "author" => Some(&mut self.author),
            "journal" => Some(&mut self.journal),
            "year" => Some(&mut self.year),
            "month" => Some(&mut self.month),
            "volume" => Some(&mut self.volume),
            "number" => Some(&mut self.number),
            "pages" => Some(&mut self.pages),
            _ => None,
        }
    }

    /// Build the human-readable summary lines.
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            title: cite::strip_empty_braces(&self.title),
            authors: cite::format_authors(&self.author),
            journal: cite::format_journal(self),
            date: cite::format_date(&self.month, &self.year),
        }
    }
}

/// Extract the known fields from raw BibTeX text.
///
/// Keys are matched case-insensitively and later occurrences overwrite
/// earlier ones. The entry structure itself is not validated.
pub fn parse_bibtex(bibtex: &str) -> BibFields {
    let mut fields = BibFields::default();
    let Some(field_regex) = field_regex() else {
        return fields;
    };

    for caps in field_regex.captures_iter(bibtex) {
        let key = caps[1].to_lowercase();
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        if let Some(slot) = fields.slot_mut(&key) {
            *slot = value.to_string();
        }
    }

    fields
}

/// Display-ready article lines. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub date: String,
}
