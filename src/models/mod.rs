//! Core data models: DOIs and parsed BibTeX records.

mod doi;
mod record;

pub use doi::{extract_doi, Doi};
pub use record::{parse_bibtex, ArticleSummary, BibFields, KNOWN_FIELDS};
