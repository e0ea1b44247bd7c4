use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::agent::{AgentFactory, AgentRun, ModelTier, ResearchAgent, SourceRef};
use crate::error::{GenerationErrorKind, NewsletterError};
use crate::llm::UsageMetadata;
use crate::prompt::build_prompt;
use crate::search_params::{map_search_params, RecencyCode};

/// What to write a newsletter about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterRequest {
    pub topic: String,
    pub result_limit: u32,
    pub recency_code: String,
}

impl NewsletterRequest {
    pub const DEFAULT_LIMIT: u32 = 5;

    /// Request with the default limit (5) and window (past week)
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            result_limit: Self::DEFAULT_LIMIT,
            recency_code: RecencyCode::default().token().to_string(),
        }
    }

    pub fn with_limit(mut self, result_limit: u32) -> Self {
        self.result_limit = result_limit;
        self
    }

    pub fn with_recency(mut self, recency_code: impl Into<String>) -> Self {
        self.recency_code = recency_code.into();
        self
    }
}

/// A generated newsletter. `content` is the agent's answer, unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct Newsletter {
    pub topic: String,
    pub content: String,
    pub tier: ModelTier,
    pub model: String,
    pub recency_phrase: String,
    pub usage: UsageMetadata,
    pub sources: Vec<SourceRef>,
    pub tool_calls: usize,
    pub generated_at: DateTime<Utc>,
}

pub type NewsletterResult = Result<Newsletter, NewsletterError>;

/// Sequences agent construction (primary, then fallback once), prompt
/// synthesis and a single time-boxed agent run.
pub struct NewsletterGenerator {
    factory: Arc<dyn AgentFactory>,
    run_timeout: Duration,
}

impl NewsletterGenerator {
    pub fn new(factory: Arc<dyn AgentFactory>, run_timeout: Duration) -> Self {
        Self { factory, run_timeout }
    }

    /// Construct an agent for this call, falling back to the second tier once.
    fn select_agent(&self) -> Result<Box<dyn ResearchAgent>, NewsletterError> {
        let primary = match self.factory.create_agent(ModelTier::Primary) {
            Ok(agent) => return Ok(agent),
            Err(e) => e,
        };
        warn!(
            model = %primary.model,
            "Falling back to {} tier due to: {}",
            ModelTier::Fallback,
            primary
        );

        match self.factory.create_agent(ModelTier::Fallback) {
            Ok(agent) => Ok(agent),
            Err(fallback) => Err(NewsletterError::AgentConstruction { primary, fallback }),
        }
    }

    pub async fn generate_newsletter(&self, request: &NewsletterRequest) -> NewsletterResult {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(NewsletterError::InvalidRequest("topic is empty".to_string()));
        }
        if request.result_limit == 0 {
            return Err(NewsletterError::InvalidRequest(
                "result limit must be a positive integer".to_string(),
            ));
        }

        let agent = self.select_agent()?;
        let tier = agent.tier();

        let (search, recency_phrase) =
            map_search_params(request.result_limit, &request.recency_code);
        let run = AgentRun {
            prompt: build_prompt(topic, request.result_limit, recency_phrase),
            search,
        };

        info!(
            topic,
            %tier,
            limit = run.search.limit,
            tbs = ?run.search.recency_token,
            "Generating newsletter"
        );

        let response = match tokio::time::timeout(self.run_timeout, agent.run(&run)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(NewsletterError::Generation {
                    kind: GenerationErrorKind::Runtime,
                    tier,
                    source,
                })
            }
            Err(_) => {
                return Err(NewsletterError::Generation {
                    kind: GenerationErrorKind::Timeout,
                    tier,
                    source: anyhow::anyhow!(
                        "agent run exceeded {}s",
                        self.run_timeout.as_secs_f64()
                    ),
                })
            }
        };

        Ok(Newsletter {
            topic: topic.to_string(),
            content: response.content,
            tier,
            model: response.model,
            recency_phrase: recency_phrase.to_string(),
            usage: response.usage,
            sources: response.sources,
            tool_calls: response.tool_calls,
            generated_at: Utc::now(),
        })
    }

    /// Generate one newsletter per request, in order. A failed topic does
    /// not stop the remaining ones.
    pub async fn generate_many(&self, requests: &[NewsletterRequest]) -> Vec<NewsletterResult> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.generate_newsletter(request).await;
            if let Err(e) = &result {
                error!(topic = %request.topic, "newsletter failed: {}", e);
            }
            results.push(result);
        }
        results
    }
}
