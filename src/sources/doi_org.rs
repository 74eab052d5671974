//! DOI resolver source: BibTeX through content negotiation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::Doi;
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

const DOI_BASE: &str = "https://doi.org";
const BIBTEX_MEDIA_TYPE: &str = "application/x-bibtex";

/// doi.org resolver
///
/// The resolver redirects to the registration agency, which answers with a
/// BibTeX record when asked for `application/x-bibtex`.
#[derive(Debug, Clone)]
pub struct DoiOrgSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl DoiOrgSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?), DOI_BASE))
    }

    /// Use a shared client and a custom resolver root
    pub fn with_client(client: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Source for DoiOrgSource {
    fn id(&self) -> &str {
        "doi"
    }

    fn name(&self) -> &str {
        "doi.org"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::BIBTEX
    }

    async fn fetch_bibtex(&self, doi: &Doi) -> Result<String, SourceError> {
        let url = format!("{}/{}", self.base_url, doi.encoded());
        tracing::debug!(%url, "requesting BibTeX");

        let response = self
            .client
            .get_accepting(&url, BIBTEX_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch BibTeX: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(%doi, status = status.as_u16(), "BibTeX request rejected");
            return Err(SourceError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read BibTeX: {}", e)))
    }
}
