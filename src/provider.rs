//! Rank lookup against a JSON-over-HTTP search-results API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{LocaleConfig, ProviderConfig};
use crate::error::ProviderError;
use crate::model::{normalize_domain, RankPosition};

/// Outcome of one provider lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankLookup {
    pub position: RankPosition,
    pub url: Option<String>,
}

impl RankLookup {
    pub fn not_found() -> Self {
        RankLookup {
            position: RankPosition::NotFound,
            url: None,
        }
    }
}

/// Returns the current search position of `domain` for `keyword`, or the
/// "not found" sentinel when the domain does not appear within the first
/// `window_size` results.
#[async_trait]
pub trait RankLookupProvider: Send + Sync {
    async fn lookup(
        &self,
        keyword: &str,
        domain: &str,
        locale: &LocaleConfig,
        window_size: usize,
    ) -> Result<RankLookup, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub link: String,
    pub position: Option<u32>,
}

/// Scans the organic results for the first link containing the normalized
/// domain. Results missing an explicit position fall back to their 1-based
/// index in the window.
pub fn match_organic(results: &[OrganicResult], domain: &str) -> RankLookup {
    let clean_domain = normalize_domain(domain);
    for (idx, result) in results.iter().enumerate() {
        if result.link.to_lowercase().contains(&clean_domain) {
            let position = result.position.unwrap_or(idx as u32 + 1);
            return RankLookup {
                position: RankPosition::Ranked(position),
                url: Some(result.link.clone()),
            };
        }
    }
    RankLookup::not_found()
}

/// serper.dev-shaped search client: POST `{q, gl, hl, num}` with an
/// `X-API-KEY` header, organic results come back as `{"organic": [...]}`.
pub struct HttpSearchProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpSearchProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(HttpSearchProvider { client, config })
    }

    async fn search(
        &self,
        query: &str,
        locale: &LocaleConfig,
        num: usize,
    ) -> Result<Vec<OrganicResult>, ProviderError> {
        let payload = serde_json::json!({
            "q": query,
            "gl": locale.gl,
            "hl": locale.hl,
            "google_domain": locale.google_domain,
            "location": locale.location,
            "num": num,
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(parsed.organic)
    }

    /// The first `n` organic result links for a query, for competitor
    /// content analysis.
    pub async fn top_links(
        &self,
        query: &str,
        locale: &LocaleConfig,
        n: usize,
    ) -> Result<Vec<String>, ProviderError> {
        let results = self.search(query, locale, n.max(10)).await?;
        Ok(results
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(n)
            .map(|r| r.link)
            .collect())
    }
}

#[async_trait]
impl RankLookupProvider for HttpSearchProvider {
    async fn lookup(
        &self,
        keyword: &str,
        domain: &str,
        locale: &LocaleConfig,
        window_size: usize,
    ) -> Result<RankLookup, ProviderError> {
        let results = self.search(keyword, locale, window_size).await?;
        Ok(match_organic(&results, domain))
    }
}
