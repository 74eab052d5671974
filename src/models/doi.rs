//! DOI model and extraction from free-form text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Registrant prefix of 4-9 digits, then a suffix restricted to the usual DOI characters.
const DOI_PATTERN: &str = r"(?i)10\.[0-9]{4,9}/[-._;()/:A-Z0-9]+";

static DOI_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn doi_regex() -> Option<&'static Regex> {
    DOI_REGEX.get_or_init(|| Regex::new(DOI_PATTERN).ok()).as_ref()
}

/// A Digital Object Identifier exactly as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Doi(String);

impl Doi {
    /// The DOI text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form for use as a single URL path segment.
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Find the first DOI in `input`.
///
/// Surrounding text is ignored and the match is returned verbatim: no case
/// folding, no trimming beyond what the suffix character class excludes.
pub fn extract_doi(input: &str) -> Option<Doi> {
    doi_regex()?
        .find(input)
        .map(|m| Doi(m.as_str().to_string()))
}
