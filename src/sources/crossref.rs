//! CrossRef source: fallback abstract provider.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::Doi;
use crate::sources::{non_empty, Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef research source
///
/// Uses the CrossRef REST API works endpoint for DOI metadata lookup.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::new()?),
            CROSSREF_API_BASE,
        ))
    }

    /// Use a shared client and a custom API root
    pub fn with_client(client: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn request_abstract(&self, doi: &Doi) -> Result<Option<String>, SourceError> {
        let url = format!("{}/works/{}", self.base_url, doi.encoded());

        let response = self
            .client
            .get_accepting(&url, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch DOI: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "CrossRef API returned status: {}",
                response.status()
            )));
        }

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(data
            .message
            .and_then(|message| message.items.into_iter().next())
            .and_then(|item| item.r#abstract))
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::ABSTRACT
    }

    async fn fetch_abstract(&self, doi: &Doi) -> Option<String> {
        match self.request_abstract(doi).await {
            Ok(text) => non_empty(text),
            Err(e) => {
                tracing::debug!(%doi, error = %e, "CrossRef abstract lookup failed");
                None
            }
        }
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    #[serde(default)]
    message: Option<CRMessage>,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(default)]
    r#abstract: Option<String>,
}
