//! Instruction text for the research agent.

/// Fixed behavior of every research agent: persona, search strategy,
/// link format and output template.
const AGENT_INSTRUCTIONS: &str = r#"You are an elite research assistant who writes newsletters.

SEARCH STRATEGY:
1. Use the search_web tool to find recent, authoritative articles on the topic
2. Prefer primary sources and established publications over aggregators
3. Use the scrape_url tool to read an article in full when its snippet is not enough
4. Cross-check important claims across at least two sources when possible

CITATIONS:
- Every article reference must include a title and a full URL
- Write links as Markdown: [Article Title](https://full.url/path)
- Only cite URLs returned by your tools, never invent or shorten them

OUTPUT:
- Write in Markdown
- Follow the newsletter template given in the request
- Keep it factual, concise and engaging"#;

pub fn agent_instructions() -> &'static str {
    AGENT_INSTRUCTIONS
}

/// Build the request sent to the agent for one newsletter.
/// Output depends only on the arguments.
pub fn build_prompt(topic: &str, result_limit: u32, recency_phrase: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("Write a newsletter about: {}\n\n", topic));

    prompt.push_str("RESEARCH:\n");
    prompt.push_str(&format!(
        "- Use the search_web tool to find the {} most relevant articles about \"{}\".\n",
        result_limit, topic
    ));
    prompt.push_str(&format!(
        "- Only consider articles published in this time window: {}. \
         The search tool already applies this filter and returns at most {} results per search.\n",
        recency_phrase, result_limit
    ));
    prompt.push_str("- Read the most important articles in full before summarizing them.\n\n");

    prompt.push_str("CITATION REQUIREMENTS:\n");
    prompt.push_str("- Every article reference must include a title and a full URL.\n");
    prompt.push_str("- Format every link as [Article Title](https://full.url/path).\n");
    prompt.push_str("- Do not cite anything you did not retrieve with your tools.\n\n");

    prompt.push_str("NEWSLETTER TEMPLATE:\n");
    prompt.push_str("# <Headline>\n\n");
    prompt.push_str("## Summary\n");
    prompt.push_str(&format!(
        "<Two or three sentences on what happened around {} in the {}.>\n\n",
        topic, recency_phrase
    ));
    prompt.push_str("## Main Stories\n");
    prompt.push_str("### [<Story title>](<full URL>)\n");
    prompt.push_str("<What happened and why it matters.>\n\n");
    prompt.push_str("## Quick Updates\n");
    prompt.push_str("- [<Title>](<full URL>): <one line>\n\n");
    prompt.push_str("## Sources\n");
    prompt.push_str("- [<Title>](<full URL>)\n");

    prompt
}
