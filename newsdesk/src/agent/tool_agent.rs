use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AgentResponse, AgentRun, ModelTier, ResearchAgent, SourceRef};
use crate::llm::{ChatMessage, LlmProvider, LlmRequest, ToolCall, ToolDefinition, UsageMetadata};
use crate::search::SearchTool;
use crate::search_params::SearchParams;

const SEARCH_TOOL: &str = "search_web";
const SCRAPE_TOOL: &str = "scrape_url";

/// Agent running a bounded function-calling loop against a chat model
pub struct ToolAgent {
    tier: ModelTier,
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchTool>,
    instructions: String,
    max_iterations: usize,
    max_content_chars: usize,
}

impl ToolAgent {
    pub fn new(
        tier: ModelTier,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchTool>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            tier,
            llm,
            search,
            instructions: instructions.into(),
            max_iterations: 8,
            max_content_chars: 4000,
        }
    }

    pub fn with_limits(mut self, max_iterations: usize, max_content_chars: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self.max_content_chars = max_content_chars;
        self
    }

    fn system_message(&self) -> ChatMessage {
        ChatMessage::system(format!(
            "{}\n\nCurrent date and time: {}",
            self.instructions,
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        ))
    }

    /// Execute one tool call. Failures become tool output so the model can
    /// recover; they never abort the run.
    async fn execute_tool(
        &self,
        call: &ToolCall,
        params: &SearchParams,
        sources: &mut SourceCollector,
    ) -> String {
        let result = match call.function.name.as_str() {
            SEARCH_TOOL => self.search_web(&call.function.arguments, params, sources).await,
            SCRAPE_TOOL => self.scrape_url(&call.function.arguments).await,
            other => Err(anyhow::anyhow!("unknown tool '{}'", other)),
        };

        result.unwrap_or_else(|e| {
            warn!(tool = %call.function.name, "agent: tool call failed: {:#}", e);
            format!("Error: {:#}", e)
        })
    }

    async fn search_web(
        &self,
        arguments: &str,
        params: &SearchParams,
        sources: &mut SourceCollector,
    ) -> Result<String> {
        let args: SearchArgs = serde_json::from_str(arguments)
            .with_context(|| format!("invalid {} arguments: {}", SEARCH_TOOL, arguments))?;

        let documents = self.search.search(&args.query, params).await?;
        if documents.is_empty() {
            return Ok(format!("No results for '{}'.", args.query));
        }

        let mut out = String::new();
        for (i, doc) in documents.iter().enumerate() {
            sources.add(doc.title.clone(), &doc.url);

            out.push_str(&format!(
                "### {}. {}\nURL: {}\n",
                i + 1,
                doc.title.as_deref().unwrap_or("(untitled)"),
                doc.url
            ));
            if let Some(description) = &doc.description {
                out.push_str(&format!("{}\n", description));
            }
            if let Some(markdown) = &doc.markdown {
                out.push_str(&format!("\n{}\n", truncate_chars(markdown, self.max_content_chars)));
            }
            out.push('\n');
        }
        Ok(out)
    }

    async fn scrape_url(&self, arguments: &str) -> Result<String> {
        let args: ScrapeArgs = serde_json::from_str(arguments)
            .with_context(|| format!("invalid {} arguments: {}", SCRAPE_TOOL, arguments))?;

        let page = self.search.scrape(&args.url).await?;
        Ok(format!(
            "# {}\nURL: {}\n\n{}",
            page.title.as_deref().unwrap_or("(untitled)"),
            page.url,
            truncate_chars(&page.markdown, self.max_content_chars)
        ))
    }
}

#[async_trait::async_trait]
impl ResearchAgent for ToolAgent {
    fn tier(&self) -> ModelTier {
        self.tier
    }

    async fn run(&self, run: &AgentRun) -> Result<AgentResponse> {
        let mut messages = vec![self.system_message(), ChatMessage::user(run.prompt.clone())];
        let tools = tool_definitions();
        let mut usage = UsageMetadata::default();
        let mut sources = SourceCollector::default();
        let mut tool_calls = 0;

        for turn in 1..=self.max_iterations {
            let response = self
                .llm
                .generate(LlmRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                    ..Default::default()
                })
                .await
                .with_context(|| format!("model turn {} failed", turn))?;
            usage.accumulate(&response.usage);

            if response.tool_calls.is_empty() {
                let content = response
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .context("model returned neither content nor tool calls")?;

                info!(
                    tier = %self.tier,
                    turns = turn,
                    tool_calls,
                    tokens = usage.total_tokens,
                    "agent: run complete"
                );
                return Ok(AgentResponse {
                    content,
                    model: response.model,
                    usage,
                    sources: sources.into_vec(),
                    tool_calls,
                });
            }

            debug!(turn, calls = response.tool_calls.len(), "agent: model requested tools");
            messages.push(ChatMessage::assistant_tool_calls(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                tool_calls += 1;
                let output = self.execute_tool(call, &run.search, &mut sources).await;
                messages.push(ChatMessage::tool(call.id.clone(), output));
            }
        }

        anyhow::bail!(
            "agent did not produce a newsletter within {} model turns",
            self.max_iterations
        )
    }
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            SEARCH_TOOL,
            "Search the web for recent articles. \
             The result limit and time window are fixed by the request.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::function(
            SCRAPE_TOOL,
            "Fetch a web page and return its main content as markdown.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Full URL of the page" }
                },
                "required": ["url"]
            }),
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct ScrapeArgs {
    url: String,
}

/// Sources in first-seen order, unique by URL
#[derive(Default)]
struct SourceCollector {
    seen: HashSet<String>,
    sources: Vec<SourceRef>,
}

impl SourceCollector {
    fn add(&mut self, title: Option<String>, url: &str) {
        if self.seen.insert(url.to_string()) {
            self.sources.push(SourceRef { title, url: url.to_string() });
        }
    }

    fn into_vec(self) -> Vec<SourceRef> {
        self.sources
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FunctionCall, LlmResponse};
    use crate::search::{ScrapedPage, SearchDocument};
    use std::sync::Mutex;

    /// Replays canned responses and records every request
    struct ScriptedLlm {
        responses: Mutex<Vec<LlmResponse>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedLlm {
        fn new(mut responses: Vec<LlmResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses.lock().unwrap().pop().context("script exhausted")
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        seen_params: Mutex<Vec<(String, SearchParams)>>,
    }

    #[async_trait::async_trait]
    impl SearchTool for FakeSearch {
        async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<SearchDocument>> {
            self.seen_params.lock().unwrap().push((query.to_string(), params.clone()));
            Ok(vec![
                SearchDocument {
                    url: "https://example.com/a".to_string(),
                    title: Some("Story A".to_string()),
                    description: Some("About A".to_string()),
                    markdown: Some("x".repeat(50)),
                },
                SearchDocument {
                    url: "https://example.com/a".to_string(),
                    title: Some("Story A again".to_string()),
                    description: None,
                    markdown: None,
                },
            ])
        }

        async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
            anyhow::bail!("cannot scrape {}", url)
        }
    }

    fn text(content: &str) -> LlmResponse {
        LlmResponse {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            usage: UsageMetadata {
                prompt_tokens: 1,
                completion_tokens: 1,
                total_tokens: 2,
            },
            model: "gemini-1.5-flash".to_string(),
        }
    }

    fn calls(calls: &[(&str, &str)]) -> LlmResponse {
        LlmResponse {
            content: None,
            tool_calls: calls
                .iter()
                .enumerate()
                .map(|(i, (name, args))| ToolCall {
                    id: format!("call_{}", i),
                    kind: "function".to_string(),
                    function: FunctionCall {
                        name: name.to_string(),
                        arguments: args.to_string(),
                    },
                })
                .collect(),
            usage: UsageMetadata {
                prompt_tokens: 3,
                completion_tokens: 1,
                total_tokens: 4,
            },
            model: "gemini-1.5-flash".to_string(),
        }
    }

    fn run(prompt: &str) -> AgentRun {
        AgentRun {
            prompt: prompt.to_string(),
            search: params(),
        }
    }

    fn params() -> SearchParams {
        SearchParams {
            limit: 3,
            recency_token: Some("qdr:d".to_string()),
        }
    }

    #[tokio::test]
    async fn search_calls_use_per_run_params_and_collect_sources() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            calls(&[(SEARCH_TOOL, r#"{"query":"ai news"}"#)]),
            text("# Newsletter"),
        ]));
        let search = Arc::new(FakeSearch::default());
        let agent = ToolAgent::new(ModelTier::Fallback, llm.clone(), search.clone(), "be useful");

        let response = agent
            .run(&run("Write"))
            .await
            .expect("run succeeds");

        assert_eq!(response.content, "# Newsletter");
        assert_eq!(response.tool_calls, 1);
        assert_eq!(response.usage.total_tokens, 6);
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].title.as_deref(), Some("Story A"));

        let seen = search.seen_params.lock().unwrap();
        assert_eq!(seen[0].0, "ai news");
        assert_eq!(seen[0].1, params());

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].messages[0].content.as_deref().unwrap().starts_with("be useful"));
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("call_0"));
        assert!(last.content.as_deref().unwrap().contains("URL: https://example.com/a"));
    }

    #[tokio::test]
    async fn tool_failures_are_reported_to_the_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            calls(&[
                (SCRAPE_TOOL, r#"{"url":"https://example.com/x"}"#),
                ("unknown", "{}"),
                (SEARCH_TOOL, "not json"),
            ]),
            text("done"),
        ]));
        let search = Arc::new(FakeSearch::default());
        let agent = ToolAgent::new(ModelTier::Primary, llm.clone(), search, "i");

        let response = agent
            .run(&run("p"))
            .await
            .expect("run succeeds");
        assert_eq!(response.tool_calls, 3);

        let requests = llm.requests.lock().unwrap();
        let outputs: Vec<&str> = requests[1]
            .messages
            .iter()
            .filter(|m| m.tool_call_id.is_some())
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(outputs.len(), 3);
        assert!(outputs[0].contains("cannot scrape"));
        assert!(outputs[1].contains("unknown tool"));
        assert!(outputs[2].contains("invalid search_web arguments"));
    }

    #[tokio::test]
    async fn run_gives_up_after_max_iterations() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            calls(&[(SEARCH_TOOL, r#"{"query":"a"}"#)]),
            calls(&[(SEARCH_TOOL, r#"{"query":"b"}"#)]),
        ]));
        let agent = ToolAgent::new(ModelTier::Primary, llm, Arc::new(FakeSearch::default()), "i")
            .with_limits(2, 100);

        let err = agent
            .run(&run("p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("within 2 model turns"));
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![text("   ")]));
        let agent = ToolAgent::new(ModelTier::Primary, llm, Arc::new(FakeSearch::default()), "i");

        let err = agent
            .run(&run("p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("neither content nor tool calls"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
