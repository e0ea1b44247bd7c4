use std::sync::Arc;
use tracing::debug;

use common::Config;

use super::{AgentFactory, ModelTier, ResearchAgent, ToolAgent};
use crate::credentials::Credentials;
use crate::error::AgentConstructionError;
use crate::llm::remote::RemoteLlmProvider;
use crate::prompt;
use crate::search::firecrawl::FirecrawlClient;

/// Builds [`ToolAgent`]s talking to the configured model endpoint and Firecrawl.
/// Construction is local wiring only; nothing is sent over the network.
pub struct RemoteAgentFactory {
    config: Config,
    credentials: Credentials,
}

impl RemoteAgentFactory {
    pub fn new(config: Config, credentials: Credentials) -> Self {
        Self { config, credentials }
    }

    pub fn model_id(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Primary => &self.config.model.primary,
            ModelTier::Fallback => &self.config.model.fallback,
        }
    }

    fn build(&self, model: &str, tier: ModelTier) -> anyhow::Result<ToolAgent> {
        let model_cfg = &self.config.model;
        let llm = RemoteLlmProvider::new(
            model_cfg.api_url.clone(),
            self.credentials.model_api_key(),
            model,
        )?
        .with_defaults(model_cfg.timeout_seconds, model_cfg.max_tokens, model_cfg.temperature);

        let search_cfg = &self.config.search;
        let search = FirecrawlClient::new(
            search_cfg.api_url.clone(),
            self.credentials.search_api_key(),
            search_cfg.timeout_seconds,
        )?;

        Ok(ToolAgent::new(tier, Arc::new(llm), Arc::new(search), prompt::agent_instructions())
            .with_limits(
                self.config.generation.max_tool_iterations,
                search_cfg.max_content_chars,
            ))
    }
}

impl AgentFactory for RemoteAgentFactory {
    fn create_agent(
        &self,
        tier: ModelTier,
    ) -> Result<Box<dyn ResearchAgent>, AgentConstructionError> {
        let model = self.model_id(tier).to_string();
        debug!(%tier, %model, "factory: constructing research agent");

        match self.build(&model, tier) {
            Ok(agent) => Ok(Box::new(agent)),
            Err(source) => Err(AgentConstructionError { tier, model, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("model-key", "search-key")
    }

    #[test]
    fn builds_both_tiers_with_default_config() {
        let factory = RemoteAgentFactory::new(Config::default(), credentials());

        let primary = factory.create_agent(ModelTier::Primary).expect("primary");
        let fallback = factory.create_agent(ModelTier::Fallback).expect("fallback");

        assert_eq!(primary.tier(), ModelTier::Primary);
        assert_eq!(fallback.tier(), ModelTier::Fallback);
        assert_eq!(factory.model_id(ModelTier::Primary), "gemini-1.5-pro");
        assert_eq!(factory.model_id(ModelTier::Fallback), "gemini-1.5-flash");
    }

    #[test]
    fn wiring_failures_become_construction_errors() {
        let mut config = Config::default();
        config.model.primary = String::new();
        let factory = RemoteAgentFactory::new(config, credentials());

        let err = factory.create_agent(ModelTier::Primary).err().expect("must fail");
        assert_eq!(err.tier, ModelTier::Primary);
        assert!(err.to_string().contains("primary"));
        assert!(err.to_string().contains("no model id configured"));

        assert!(factory.create_agent(ModelTier::Fallback).is_ok());
    }

    #[test]
    fn bad_search_endpoint_fails_every_tier() {
        let mut config = Config::default();
        config.search.api_url = "::nope::".to_string();
        let factory = RemoteAgentFactory::new(config, credentials());

        for tier in [ModelTier::Primary, ModelTier::Fallback] {
            let err = factory.create_agent(tier).err().expect("must fail");
            assert!(err.to_string().contains("invalid search endpoint URL"));
        }
    }
}
