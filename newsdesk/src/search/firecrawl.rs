use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{ScrapedPage, SearchDocument, SearchTool};
use crate::search_params::SearchParams;

/// Firecrawl v1 client (search + scrape)
pub struct FirecrawlClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl FirecrawlClient {
    /// `base_url` is the API root, e.g. "https://api.firecrawl.dev/v1".
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();

        if api_key.trim().is_empty() {
            anyhow::bail!("search tool API key is empty");
        }
        url::Url::parse(&base_url)
            .with_context(|| format!("invalid search endpoint URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Newsdesk/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { base_url, api_key, client })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .with_context(|| format!("firecrawl {} request failed", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("firecrawl {} error {}: {}", endpoint, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("failed to parse firecrawl {} response", endpoint))
    }
}

#[async_trait::async_trait]
impl SearchTool for FirecrawlClient {
    async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<SearchDocument>> {
        let body = SearchBody {
            query,
            limit: params.limit,
            tbs: params.recency_token.as_deref(),
            scrape_options: ScrapeOptions {
                formats: &["markdown"],
            },
        };

        debug!(query, limit = params.limit, tbs = ?params.recency_token, "firecrawl: search");
        let resp: SearchResponse = self.post("search", &body).await?;
        if !resp.success {
            anyhow::bail!(
                "firecrawl search unsuccessful: {}",
                resp.error.unwrap_or_else(|| "no error message".to_string())
            );
        }

        info!("firecrawl: search '{}' returned {} documents", query, resp.data.len());
        Ok(resp.data)
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let body = ScrapeBody {
            url,
            formats: &["markdown"],
            only_main_content: true,
        };

        let resp: ScrapeResponse = self.post("scrape", &body).await?;
        if !resp.success {
            anyhow::bail!(
                "firecrawl scrape of {} unsuccessful: {}",
                url,
                resp.error.unwrap_or_else(|| "no error message".to_string())
            );
        }

        let data = resp.data.context("firecrawl scrape response has no data")?;
        let markdown = data.markdown.unwrap_or_default();
        info!("firecrawl: scraped {} chars markdown from {}", markdown.len(), url);

        let metadata = data.metadata.unwrap_or_default();
        Ok(ScrapedPage {
            url: metadata.source_url.unwrap_or_else(|| url.to_string()),
            title: metadata.title,
            markdown,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    query: &'a str,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tbs: Option<&'a str>,
    scrape_options: ScrapeOptions<'a>,
}

#[derive(Debug, Serialize)]
struct ScrapeOptions<'a> {
    formats: &'a [&'a str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [&'a str],
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    success: bool,
    #[serde(default)]
    data: Vec<SearchDocument>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "sourceURL")]
    source_url: Option<String>,
}
