//! arXiv research source implementation.

use async_trait::async_trait;
use feed_rs::parser;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::models::{Paper, PaperBuilder};
use crate::sources::{Source, SourceError, ARCHIVE_FILE_NAME};
use crate::utils::{is_gzip, HttpClient};

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
/// Base URL for arXiv source archives
pub const ARXIV_EPRINT_URL: &str = "https://arxiv.org/e-print";

/// New style (`1802.08395`, `1802.08395v2`) and old style
/// (`math.GT/0104020`, `hep-th/9901001v1`) identifiers
fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}\.\d{4,5}|[A-Za-z\-]+(\.[A-Za-z]{2})?/\d{7})(v\d+)?$")
            .expect("arXiv id pattern is valid")
    })
}

/// arXiv research source
///
/// Supports:
/// - Lookup by identifier, abs/pdf URL or free-text query
/// - Download of the raw LaTeX source archive
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    api_url: String,
    eprint_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            api_url: ARXIV_API_URL.to_string(),
            eprint_url: ARXIV_EPRINT_URL.to_string(),
        }
    }

    /// Point the source at different endpoints (mirrors, test servers)
    pub fn with_endpoints(mut self, api_url: impl Into<String>, eprint_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self.eprint_url = eprint_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse an arXiv ID from various formats
    ///
    /// Handles formats like:
    /// - "1802.08395"
    /// - "1802.08395v1" (version is kept)
    /// - "arxiv:1802.08395"
    /// - "https://arxiv.org/abs/1802.08395v1"
    /// - "https://arxiv.org/pdf/1802.08395.pdf"
    /// - "math.GT/0104020"
    ///
    /// Returns `None` for anything that is not an identifier; such queries
    /// are sent to the search API instead.
    pub fn parse_id(query: &str) -> Option<String> {
        let mut id = query.trim();

        for marker in ["/abs/", "/pdf/", "/e-print/"] {
            if let Some(pos) = id.find(marker) {
                id = &id[pos + marker.len()..];
                break;
            }
        }

        let id = id.trim_end_matches('/');
        let id = id.strip_suffix(".pdf").unwrap_or(id);
        let id = match id.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("arxiv:") => &id[6..],
            _ => id,
        };

        id_pattern().is_match(id).then(|| id.to_string())
    }

    /// Build the API query URL for a lookup returning at most one record
    fn build_lookup_url(&self, query: &str) -> Result<String, SourceError> {
        if query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }

        Ok(match Self::parse_id(query) {
            Some(id) => format!(
                "{}?id_list={}&max_results=1",
                self.api_url,
                urlencoding::encode(&id)
            ),
            None => format!(
                "{}?search_query={}&max_results=1",
                self.api_url,
                urlencoding::encode(query.trim())
            ),
        })
    }

    /// Parse arXiv Atom feed entry into Paper
    fn parse_entry(&self, entry: &feed_rs::model::Entry) -> Result<Paper, SourceError> {
        // Keep the version suffix: e-print URLs accept it and it pins the sources
        let paper_id = entry
            .id
            .split("/abs/")
            .nth(1)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SourceError::Parse(format!("Unexpected entry id: {}", entry.id)))?
            .to_string();

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.as_str())
            .unwrap_or("");

        let authors = entry
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        Ok(PaperBuilder::new(paper_id.clone(), title, entry.id.clone())
            .authors(authors)
            .source_url(format!("{}/{}", self.eprint_url, paper_id))
            .build())
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn lookup(&self, query: &str) -> Result<Paper, SourceError> {
        let url = self.build_lookup_url(query)?;
        tracing::debug!("Querying arXiv API: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to query arXiv: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        let feed = parser::parse(bytes.as_ref())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        // Malformed ids come back as a single entry pointing at /api/errors
        let entry = feed
            .entries
            .iter()
            .find(|entry| !entry.id.contains("/api/errors"))
            .ok_or_else(|| SourceError::NotFound(query.to_string()))?;

        self.parse_entry(entry)
    }

    async fn download_source(
        &self,
        paper: &Paper,
        dest_dir: &Path,
    ) -> Result<PathBuf, SourceError> {
        let url = paper
            .source_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.eprint_url, paper.paper_id));
        tracing::debug!("Downloading sources from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to download sources: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::SourcesUnavailable(paper.paper_id.clone()));
        }
        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv e-print returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read sources: {}", e)))?;

        // PDF-only submissions are served as the PDF itself
        if !is_gzip(&bytes) {
            return Err(SourceError::SourcesUnavailable(paper.paper_id.clone()));
        }

        let path = dest_dir.join(ARCHIVE_FILE_NAME);
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!("Saved {} bytes to {}", bytes.len(), path.display());

        Ok(path)
    }
}
