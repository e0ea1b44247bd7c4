//! Research agents: a chat model bound to a search tool and fixed instructions.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AgentConstructionError;
use crate::llm::UsageMetadata;
use crate::search_params::SearchParams;

mod factory;
mod tool_agent;

pub use factory::RemoteAgentFactory;
pub use tool_agent::ToolAgent;

/// Model quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Most capable model ("pro")
    Primary,
    /// Cheaper, more available model ("flash")
    Fallback,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Primary => f.write_str("primary"),
            ModelTier::Fallback => f.write_str("fallback"),
        }
    }
}

/// Input of one agent run
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub prompt: String,
    pub search: SearchParams,
}

/// A page the agent's search tool surfaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: Option<String>,
    pub url: String,
}

/// Raw agent output plus what was observed while producing it
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub content: String,
    /// Model id reported by the provider
    pub model: String,
    pub usage: UsageMetadata,
    pub sources: Vec<SourceRef>,
    pub tool_calls: usize,
}

#[async_trait::async_trait]
pub trait ResearchAgent: Send + Sync {
    /// Tier this agent was built for
    fn tier(&self) -> ModelTier;

    async fn run(&self, run: &AgentRun) -> Result<AgentResponse>;
}

/// Builds agents per tier. Implementations do not retry; tier fallback is
/// decided by the caller.
pub trait AgentFactory: Send + Sync {
    fn create_agent(
        &self,
        tier: ModelTier,
    ) -> Result<Box<dyn ResearchAgent>, AgentConstructionError>;
}
