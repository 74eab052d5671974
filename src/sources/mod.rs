//! Metadata sources with a trait-based plugin architecture.
//!
//! Every service implements [`Source`] and advertises what it can do through
//! [`SourceCapabilities`]. The [`SourceRegistry`] keeps sources in priority
//! order: the first source with [`SourceCapabilities::BIBTEX`] is the
//! authoritative record source, and sources with
//! [`SourceCapabilities::ABSTRACT`] are tried in turn until one returns an
//! abstract.
//!
//! The two kinds of lookup fail differently. A BibTeX fetch returns a
//! [`SourceError`] that aborts the lookup. An abstract fetch returns `None`
//! for anything that goes wrong, so the next source gets its turn.

mod crossref;
mod doi_org;
mod registry;
mod semantic;

pub mod mock;

pub use crossref::CrossRefSource;
pub use doi_org::DoiOrgSource;
pub use mock::{MockAbstractSource, MockBibtexSource};
pub use registry::{SourceCapabilities, SourceRegistry};
pub use semantic::SemanticScholarSource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::Doi;

/// Shown in place of an abstract when no source has one.
pub const ABSTRACT_PLACEHOLDER: &str =
    "Abstract couldn't be found on Semantic Scholar or Crossref";

/// The Source trait defines the interface for all metadata services.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Implement `id`, `name` and `capabilities`
/// 3. Implement `fetch_bibtex` and/or `fetch_abstract` to match the capabilities
/// 4. Register it with [`SourceRegistry::register`] in the desired priority order
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "doi", "semantic", "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities;

    /// Whether this source can return BibTeX records
    fn supports_bibtex(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::BIBTEX)
    }

    /// Whether this source can return abstracts
    fn supports_abstract(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::ABSTRACT)
    }

    /// Fetch the raw BibTeX record for a DOI
    async fn fetch_bibtex(&self, _doi: &Doi) -> Result<String, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Fetch the abstract for a DOI. `None` covers every kind of failure.
    async fn fetch_abstract(&self, _doi: &Doi) -> Option<String> {
        None
    }
}

/// Try each source in order and return the first abstract found.
///
/// Later sources are not contacted once one succeeds.
pub async fn first_abstract(sources: &[Arc<dyn Source>], doi: &Doi) -> Option<String> {
    for source in sources {
        if let Some(text) = source.fetch_abstract(doi).await {
            tracing::debug!(source = source.id(), %doi, "abstract found");
            return Some(text);
        }
        tracing::debug!(source = source.id(), %doi, "no abstract, trying next source");
    }
    None
}

/// Treat missing, null and empty abstracts alike.
pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// The BibTeX service answered with a non-success status
    #[error("Failed to fetch BibTeX: {0}")]
    Status(u16),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (JSON, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// No source with the required capability is registered
    #[error("No source available for {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extract_doi;

    fn doi() -> Doi {
        extract_doi("10.1000/xyz123").unwrap()
    }

    #[tokio::test]
    async fn test_first_abstract_primary_wins() {
        let primary = Arc::new(MockAbstractSource::new("primary").with_abstract("from primary"));
        let fallback = Arc::new(MockAbstractSource::new("fallback").with_abstract("from fallback"));
        let sources: Vec<Arc<dyn Source>> = vec![primary.clone(), fallback.clone()];

        let result = first_abstract(&sources, &doi()).await;
        assert_eq!(result.as_deref(), Some("from primary"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_first_abstract_falls_back() {
        let primary = Arc::new(MockAbstractSource::new("primary"));
        let fallback = Arc::new(MockAbstractSource::new("fallback").with_abstract("from fallback"));
        let sources: Vec<Arc<dyn Source>> = vec![primary.clone(), fallback.clone()];

        let result = first_abstract(&sources, &doi()).await;
        assert_eq!(result.as_deref(), Some("from fallback"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_first_abstract_none() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockAbstractSource::new("a")),
            Arc::new(MockAbstractSource::new("b")),
        ];
        assert!(first_abstract(&sources, &doi()).await.is_none());
        assert!(first_abstract(&[], &doi()).await.is_none());
    }

    #[test]
    fn test_status_error_message() {
        assert_eq!(
            SourceError::Status(404).to_string(),
            "Failed to fetch BibTeX: 404"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("x".into())).as_deref(), Some("x"));
        assert!(non_empty(Some(String::new())).is_none());
        assert!(non_empty(None).is_none());
    }
}
