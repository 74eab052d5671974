//! The lookup pipeline: input text to BibTeX record, parsed fields and abstract.

use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{extract_doi, parse_bibtex, ArticleSummary, BibFields, Doi};
use crate::sources::{first_abstract, Source, SourceError, SourceRegistry, ABSTRACT_PLACEHOLDER};

/// Problems with the user's input. Nothing is fetched when these occur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please enter a DOI")]
    Empty,

    #[error("No valid DOI found in input")]
    NoDoi,
}

/// Anything that stops a lookup from producing a record
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A fetched and parsed BibTeX record
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub doi: Doi,
    pub bibtex: String,
    pub fields: BibFields,
    pub summary: ArticleSummary,
}

/// Everything a completed lookup produced
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl LookupResult {
    /// The abstract, or the placeholder when no source had one
    pub fn abstract_or_placeholder(&self) -> &str {
        self.abstract_text.as_deref().unwrap_or(ABSTRACT_PLACEHOLDER)
    }
}

/// Resolve user input to a DOI. Input is trimmed before the emptiness check.
pub fn resolve_input(input: &str) -> Result<Doi, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::Empty);
    }
    extract_doi(input).ok_or(InputError::NoDoi)
}

/// Runs lookups against a fixed BibTeX source and abstract chain
#[derive(Debug, Clone)]
pub struct Lookup {
    bibtex: Arc<dyn Source>,
    abstracts: Vec<Arc<dyn Source>>,
}

impl Lookup {
    /// Build from explicit sources. `abstracts` are tried in order.
    pub fn new(bibtex: Arc<dyn Source>, abstracts: Vec<Arc<dyn Source>>) -> Self {
        Self { bibtex, abstracts }
    }

    /// Build from a registry's priority order
    pub fn from_registry(registry: &SourceRegistry) -> Result<Self, SourceError> {
        Ok(Self::new(
            registry.bibtex_source()?,
            registry.abstract_sources(),
        ))
    }

    /// Build the standard doi.org / Semantic Scholar / Crossref pipeline
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Self::from_registry(&SourceRegistry::from_config(config)?)
    }

    /// Fetch and parse the BibTeX record. Failure here aborts the lookup.
    pub async fn fetch_record(&self, doi: &Doi) -> Result<Record, SourceError> {
        tracing::info!(%doi, source = self.bibtex.id(), "fetching BibTeX");
        let bibtex = self.bibtex.fetch_bibtex(doi).await?;
        let fields = parse_bibtex(&bibtex);
        let summary = fields.summary();
        Ok(Record {
            doi: doi.clone(),
            bibtex,
            fields,
            summary,
        })
    }

    /// Walk the abstract chain. Never fails.
    pub async fn fetch_abstract(&self, doi: &Doi) -> Option<String> {
        let found = first_abstract(&self.abstracts, doi).await;
        if found.is_none() {
            tracing::info!(%doi, "no abstract available");
        }
        found
    }

    /// Record first, then the abstract chain
    pub async fn fetch(&self, doi: &Doi) -> Result<LookupResult, SourceError> {
        let record = self.fetch_record(doi).await?;
        let abstract_text = self.fetch_abstract(doi).await;
        Ok(LookupResult {
            record,
            abstract_text,
        })
    }

    /// Resolve the input and run the full lookup
    pub async fn run(&self, input: &str) -> Result<LookupResult, LookupError> {
        let doi = resolve_input(input)?;
        Ok(self.fetch(&doi).await?)
    }
}
