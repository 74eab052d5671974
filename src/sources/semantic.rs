//! Semantic Scholar source: primary abstract provider.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::Doi;
use crate::sources::{non_empty, Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// Semantic Scholar research source
///
/// Uses the Graph API paper endpoint, addressing papers as `DOI:<doi>`.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarSource {
    /// Create a new Semantic Scholar source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::new()?),
            SEMANTIC_API_BASE,
            std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        ))
    }

    /// Use a shared client, a custom API root and an optional API key
    pub fn with_client(client: Arc<HttpClient>, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build request URL for a paper's abstract
    fn abstract_url(&self, doi: &Doi) -> String {
        format!(
            "{}/paper/DOI:{}?fields=abstract",
            self.base_url,
            doi.encoded()
        )
    }

    /// Add API key to request headers if available
    fn add_api_key_if_present(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref key) = self.api_key {
            builder.header("x-api-key", key)
        } else {
            builder
        }
    }

    async fn request_abstract(&self, doi: &Doi) -> Result<Option<String>, SourceError> {
        let url = self.abstract_url(doi);
        let response = self
            .add_api_key_if_present(self.client.get_accepting(&url, "application/json"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "Semantic Scholar API returned status: {}",
                response.status()
            )));
        }

        let data: S2Paper = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(data.r#abstract)
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::ABSTRACT
    }

    async fn fetch_abstract(&self, doi: &Doi) -> Option<String> {
        match self.request_abstract(doi).await {
            Ok(text) => non_empty(text),
            Err(e) => {
                tracing::debug!(%doi, error = %e, "Semantic Scholar abstract lookup failed");
                None
            }
        }
    }
}

// ===== Semantic Scholar API Types =====

#[derive(Debug, Deserialize)]
struct S2Paper {
    #[serde(default)]
    r#abstract: Option<String>,
}
