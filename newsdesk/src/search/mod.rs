use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::search_params::SearchParams;

/// Web search / content extraction capability the research agent is bound to
#[async_trait::async_trait]
pub trait SearchTool: Send + Sync {
    /// Search the web, applying the per-call limit and time filter
    async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<SearchDocument>>;

    /// Fetch one page and return its main content as markdown
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Page content, when the tool extracted it along with the hit
    #[serde(default)]
    pub markdown: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

pub mod firecrawl;
