//! Registry for managing metadata source plugins.

use std::sync::Arc;

use super::{CrossRefSource, DoiOrgSource, SemanticScholarSource, Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const BIBTEX = 1 << 0;
        const ABSTRACT = 1 << 1;
    }
}

/// Registry of available sources, kept in priority order
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the standard registry: doi.org for BibTeX, then Semantic
    /// Scholar and Crossref for abstracts
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        let endpoints = &config.endpoints;

        let mut registry = Self::new();
        registry.register(Arc::new(DoiOrgSource::with_client(
            Arc::clone(&client),
            &endpoints.doi_base,
        )));
        registry.register(Arc::new(SemanticScholarSource::with_client(
            Arc::clone(&client),
            &endpoints.semantic_scholar_base,
            config.api_keys.semantic_scholar.clone(),
        )));
        registry.register(Arc::new(CrossRefSource::with_client(
            client,
            &endpoints.crossref_base,
        )));

        Ok(registry)
    }

    /// Register a source at the lowest priority. A source with the same ID
    /// is replaced in place.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter().position(|s| s.id() == source.id()) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get all registered sources in priority order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get sources that support a specific capability, in priority order
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .cloned()
            .collect()
    }

    /// The authoritative BibTeX source
    pub fn bibtex_source(&self) -> Result<Arc<dyn Source>, SourceError> {
        self.with_capability(SourceCapabilities::BIBTEX)
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Unavailable("BibTeX records".to_string()))
    }

    /// Abstract sources, primary first
    pub fn abstract_sources(&self) -> Vec<Arc<dyn Source>> {
        self.with_capability(SourceCapabilities::ABSTRACT)
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
