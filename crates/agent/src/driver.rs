//! One research iteration: ask the model, run the tool it picked, and ask
//! it to analyse the result.

use std::sync::Arc;

use scholarloop_core::error::{Error, ModelError};
use scholarloop_core::message::{ContentBlock, Conversation, ConversationMessage, Role};
use scholarloop_core::progress::{ProgressEvent, ProgressSink};
use scholarloop_core::provider::{CompletionRequest, ConversationModel, ModelResponse, ToolDefinition};
use scholarloop_core::session::ResearchLog;
use scholarloop_tools::{ResearchToolCall, ResearchTools, format_search_results, research_tools};
use tracing::{debug, warn};

/// Tool result sent for every invocation after the first in one response.
pub const SKIPPED_TOOL_USE: &str =
    "Not executed: only one tool call is handled per turn. Request it again if still needed.";

/// Drives a single iteration of the research conversation.
pub struct ConversationDriver {
    model: Arc<dyn ConversationModel>,
    tools: ResearchTools,
    model_id: String,
    system_prompt: String,
    max_tokens: u32,
    results_per_search: u32,
    progress: Arc<dyn ProgressSink>,
}

impl ConversationDriver {
    pub fn new(
        model: Arc<dyn ConversationModel>,
        tools: ResearchTools,
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            model,
            tools,
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            max_tokens: 4000,
            results_per_search: 5,
            progress,
        }
    }

    /// Output budget for the decision and analysis calls.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_results_per_search(mut self, n: u32) -> Self {
        self.results_per_search = n;
        self
    }

    /// Run one iteration and return its response text.
    ///
    /// Never fails: any error becomes an in-band `"An error occurred: .."`
    /// message and an `error` progress event.
    pub async fn run_iteration(
        &self,
        conversation: &mut Conversation,
        log: &mut ResearchLog,
    ) -> String {
        match self.try_iteration(conversation, log).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Research iteration failed");
                self.progress.emit(ProgressEvent::error(format!(
                    "Error during research iteration: {e}"
                )));
                format!("An error occurred: {e}")
            }
        }
    }

    async fn try_iteration(
        &self,
        conversation: &mut Conversation,
        log: &mut ResearchLog,
    ) -> Result<String, Error> {
        self.progress
            .emit(ProgressEvent::info("Requesting the model's analysis..."));
        let response = self
            .complete(conversation, research_tools(), self.max_tokens)
            .await?;

        let Some(invocation) = response.first_tool_use() else {
            self.progress
                .emit(ProgressEvent::info("Formulating research strategy..."));
            let text = response.text();
            conversation.push(ConversationMessage::assistant(response.content))?;
            return Ok(text);
        };

        let tool_use_id = invocation.id.to_string();
        let tool_name = invocation.name.to_string();
        let call = ResearchToolCall::parse(invocation.name, invocation.input);
        let skipped: Vec<String> = response
            .tool_uses()
            .skip(1)
            .map(|t| t.id.to_string())
            .collect();
        if !skipped.is_empty() {
            debug!(skipped = skipped.len(), "Ignoring extra tool invocations");
        }

        conversation.push(ConversationMessage::assistant(response.content))?;

        let output = match call {
            Some(call) => self.dispatch(call, log).await,
            None => {
                warn!(tool = %tool_name, "Model invoked an unknown tool");
                self.progress
                    .emit(ProgressEvent::error(format!("Unknown tool requested: {tool_name}")));
                format!("Error: unknown tool '{tool_name}'")
            }
        };

        let mut results = vec![ContentBlock::ToolResult {
            tool_use_id,
            content: output,
        }];
        results.extend(skipped.into_iter().map(|id| ContentBlock::ToolResult {
            tool_use_id: id,
            content: SKIPPED_TOOL_USE.into(),
        }));
        conversation.push(ConversationMessage {
            role: Role::User,
            content: results,
        })?;

        self.progress
            .emit(ProgressEvent::info("Analyzing tool results..."));
        let analysis = self
            .complete(conversation, Vec::new(), self.max_tokens)
            .await?;
        let text = analysis.text();
        conversation.push(ConversationMessage::assistant(analysis.content))?;
        Ok(text)
    }

    async fn dispatch(&self, call: ResearchToolCall, log: &mut ResearchLog) -> String {
        match call {
            ResearchToolCall::WebSearch {
                query,
                start_date,
                end_date,
            } => {
                let range = match (&start_date, &end_date) {
                    (None, None) => String::new(),
                    (start, end) => format!(
                        " with date range: {} to {}",
                        start.as_deref().unwrap_or("any"),
                        end.as_deref().unwrap_or("present")
                    ),
                };
                self.progress.emit(ProgressEvent::search(format!(
                    "Model is searching for: '{query}'{range}"
                )));
                debug!(tool = "web_search", query = %query, "Dispatching tool");

                let results = self
                    .tools
                    .search
                    .search(log, &query, self.results_per_search, start_date, end_date)
                    .await;
                self.progress.emit(ProgressEvent::info(format!(
                    "Found {} papers. Analyzing...",
                    results.len()
                )));
                format_search_results(&results)
            }
            ResearchToolCall::GetArticleContent { url } => {
                self.progress
                    .emit(ProgressEvent::content("Retrieving full article content..."));
                debug!(tool = "get_article_content", url = %url, "Dispatching tool");

                let document = self.tools.fetch.fetch(log, &url).await;
                self.progress
                    .emit(ProgressEvent::info("Article retrieved. Analyzing..."));
                document.content
            }
        }
    }

    /// One model call over the current history.
    pub(crate) async fn complete(
        &self,
        conversation: &Conversation,
        tools: Vec<ToolDefinition>,
        max_tokens: u32,
    ) -> Result<ModelResponse, ModelError> {
        let request = CompletionRequest {
            model: self.model_id.clone(),
            system: self.system_prompt.clone(),
            messages: conversation.messages().to_vec(),
            tools,
            max_tokens,
        };
        debug!(
            provider = self.model.name(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            max_tokens,
            "Requesting completion"
        );
        let response = self.model.complete(request).await?;
        if let Some(usage) = response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion finished"
            );
        }
        Ok(response)
    }
}
