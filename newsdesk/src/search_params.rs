//! Translation of caller-facing search options into search tool parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrase used in prompts when the recency code is not recognized
pub const UNKNOWN_RECENCY_PHRASE: &str = "recent";

/// Symbolic time window for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyCode {
    PastHour,
    PastDay,
    #[default]
    PastWeek,
    PastMonth,
    PastYear,
}

impl RecencyCode {
    pub const ALL: [RecencyCode; 5] = [
        RecencyCode::PastHour,
        RecencyCode::PastDay,
        RecencyCode::PastWeek,
        RecencyCode::PastMonth,
        RecencyCode::PastYear,
    ];

    /// Native time filter token understood by the search tool
    pub fn token(self) -> &'static str {
        match self {
            RecencyCode::PastHour => "qdr:h",
            RecencyCode::PastDay => "qdr:d",
            RecencyCode::PastWeek => "qdr:w",
            RecencyCode::PastMonth => "qdr:m",
            RecencyCode::PastYear => "qdr:y",
        }
    }

    /// Human-readable window, used in prompt text only
    pub fn phrase(self) -> &'static str {
        match self {
            RecencyCode::PastHour => "past hour",
            RecencyCode::PastDay => "past 24 hours",
            RecencyCode::PastWeek => "past week",
            RecencyCode::PastMonth => "past month",
            RecencyCode::PastYear => "past year",
        }
    }

    /// Accepts tool tokens ("qdr:w"), names in any of snake/kebab/camel case
    /// ("past_week", "past-week", "pastWeek") and bare units ("week").
    pub fn parse(code: &str) -> Option<Self> {
        let normalized: String = code
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "qdr:h" | "pasthour" | "hour" => Some(RecencyCode::PastHour),
            "qdr:d" | "pastday" | "day" | "past24hours" => Some(RecencyCode::PastDay),
            "qdr:w" | "pastweek" | "week" => Some(RecencyCode::PastWeek),
            "qdr:m" | "pastmonth" | "month" => Some(RecencyCode::PastMonth),
            "qdr:y" | "pastyear" | "year" => Some(RecencyCode::PastYear),
            _ => None,
        }
    }
}

impl fmt::Display for RecencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Per-call search tool parameters. Built fresh for every generation and
/// handed to the agent by reference; never stored on a shared tool handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub limit: u32,
    /// Time filter sent to the tool; `None` searches without one
    pub recency_token: Option<String>,
}

/// Map a result limit and recency code to tool parameters plus the phrase
/// describing the window in the prompt.
///
/// The limit is passed through as given. Known codes resolve to their tool
/// token. Unknown codes are described as "recent"; they are forwarded only
/// when they already look like a tool filter (`qdr:`/`cdr:`), otherwise the
/// search runs unfiltered.
pub fn map_search_params(result_limit: u32, recency_code: &str) -> (SearchParams, &'static str) {
    match RecencyCode::parse(recency_code) {
        Some(code) => (
            SearchParams {
                limit: result_limit,
                recency_token: Some(code.token().to_string()),
            },
            code.phrase(),
        ),
        None => (
            SearchParams {
                limit: result_limit,
                recency_token: raw_tool_filter(recency_code),
            },
            UNKNOWN_RECENCY_PHRASE,
        ),
    }
}

fn raw_tool_filter(code: &str) -> Option<String> {
    let code = code.trim();
    let is_filter = ["qdr:", "cdr:"]
        .iter()
        .any(|prefix| code.len() > prefix.len() && code.starts_with(prefix));
    is_filter.then(|| code.to_string())
}
