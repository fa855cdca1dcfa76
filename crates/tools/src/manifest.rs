//! The two-tool manifest offered to the model, and typed tool calls.

use scholarloop_core::provider::ToolDefinition;
use serde::Deserialize;

pub const WEB_SEARCH: &str = "web_search";
pub const GET_ARTICLE_CONTENT: &str = "get_article_content";

/// Tool definitions sent with every research iteration.
pub fn research_tools() -> Vec<ToolDefinition> {
    vec![web_search_definition(), get_article_content_definition()]
}

fn web_search_definition() -> ToolDefinition {
    ToolDefinition {
        name: WEB_SEARCH.into(),
        description: "Search for scientific papers and articles with optional date filtering".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query. Should ideally be under 5 words."
                },
                "start_date": {
                    "type": "string",
                    "description": "Optional start date in ISO format (YYYY-MM-DDTHH:MM:SS.SSSZ)"
                },
                "end_date": {
                    "type": "string",
                    "description": "Optional end date in ISO format (YYYY-MM-DDTHH:MM:SS.SSSZ)"
                }
            },
            "required": ["query"]
        }),
    }
}

fn get_article_content_definition() -> ToolDefinition {
    ToolDefinition {
        name: GET_ARTICLE_CONTENT.into(),
        description: "Retrieve the full content of a scientific article by URL".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the article to retrieve"
                }
            },
            "required": ["url"]
        }),
    }
}

/// A tool invocation the driver knows how to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchToolCall {
    WebSearch {
        query: String,
        start_date: Option<String>,
        end_date: Option<String>,
    },
    GetArticleContent {
        url: String,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WebSearchArgs {
    query: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ArticleArgs {
    url: Option<String>,
}

impl ResearchToolCall {
    /// Interpret a tool invocation. Unknown tool names yield `None`.
    ///
    /// Missing or mistyped arguments fall back to empty strings; blank
    /// date bounds are treated as absent.
    pub fn parse(name: &str, input: &serde_json::Value) -> Option<Self> {
        match name {
            WEB_SEARCH => {
                let args: WebSearchArgs = serde_json::from_value(input.clone()).unwrap_or_default();
                Some(Self::WebSearch {
                    query: args.query.unwrap_or_default(),
                    start_date: args.start_date.filter(|d| !d.trim().is_empty()),
                    end_date: args.end_date.filter(|d| !d.trim().is_empty()),
                })
            }
            GET_ARTICLE_CONTENT => {
                let args: ArticleArgs = serde_json::from_value(input.clone()).unwrap_or_default();
                Some(Self::GetArticleContent {
                    url: args.url.unwrap_or_default(),
                })
            }
            _ => None,
        }
    }
}
