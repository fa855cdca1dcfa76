//! The research loop controller.

use std::sync::Arc;

use chrono::Local;
use scholarloop_config::AppConfig;
use scholarloop_core::capability::{ContentFetch, PaperSearch};
use scholarloop_core::message::Conversation;
use scholarloop_core::progress::{NoopProgress, ProgressEvent, ProgressSink};
use scholarloop_core::provider::ConversationModel;
use scholarloop_core::session::{ResearchLog, ResearchSession};
use scholarloop_tools::ResearchTools;
use tracing::{debug, error, info};

use crate::driver::ConversationDriver;
use crate::prompts;

/// Runs a fixed number of research iterations, then asks for the report.
///
/// Strictly sequential: iteration `i + 1` starts only after iteration `i`
/// has been recorded.
pub struct ResearchLoop {
    model: Arc<dyn ConversationModel>,
    search: Arc<dyn PaperSearch>,
    fetch: Arc<dyn ContentFetch>,
    model_id: String,
    iteration_max_tokens: u32,
    synthesis_max_tokens: u32,
    results_per_search: u32,
    progress: Arc<dyn ProgressSink>,
}

impl ResearchLoop {
    pub fn new(
        model: Arc<dyn ConversationModel>,
        search: Arc<dyn PaperSearch>,
        fetch: Arc<dyn ContentFetch>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            model,
            search,
            fetch,
            model_id: model_id.into(),
            iteration_max_tokens: 4000,
            synthesis_max_tokens: 8192,
            results_per_search: 5,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Take model id, budgets and result count from `config`.
    pub fn from_config(
        config: &AppConfig,
        model: Arc<dyn ConversationModel>,
        search: Arc<dyn PaperSearch>,
        fetch: Arc<dyn ContentFetch>,
    ) -> Self {
        Self::new(model, search, fetch, config.model.clone())
            .with_iteration_max_tokens(config.iteration_max_tokens)
            .with_synthesis_max_tokens(config.synthesis_max_tokens)
            .with_results_per_search(config.results_per_search)
    }

    pub fn with_iteration_max_tokens(mut self, max_tokens: u32) -> Self {
        self.iteration_max_tokens = max_tokens;
        self
    }

    pub fn with_synthesis_max_tokens(mut self, max_tokens: u32) -> Self {
        self.synthesis_max_tokens = max_tokens;
        self
    }

    pub fn with_results_per_search(mut self, n: u32) -> Self {
        self.results_per_search = n;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn driver(&self) -> ConversationDriver {
        let tools = ResearchTools::new(self.search.clone(), self.fetch.clone(), self.progress.clone());
        ConversationDriver::new(
            self.model.clone(),
            tools,
            self.model_id.clone(),
            prompts::system_prompt(Local::now().date_naive()),
            self.progress.clone(),
        )
        .with_max_tokens(self.iteration_max_tokens)
        .with_results_per_search(self.results_per_search)
    }

    /// Research `query` for `max_iterations` turns and synthesize a report.
    ///
    /// Always returns a report text and a session. If synthesis fails the
    /// text is an error report and the session carries the error along with
    /// every iteration recorded so far.
    pub async fn run(&self, query: &str, max_iterations: u32) -> (String, ResearchSession) {
        info!(query, max_iterations, model = %self.model_id, "Starting research run");
        self.progress
            .emit(ProgressEvent::info(format!("Starting research on: '{query}'")));
        self.progress.emit(ProgressEvent::info(format!(
            "Planning {max_iterations} research iterations"
        )));

        let driver = self.driver();
        let mut conversation = Conversation::new();
        let mut log = ResearchLog::new();
        conversation.push_user_text(prompts::initial_request(query));

        for i in 1..=max_iterations {
            self.progress
                .emit(ProgressEvent::iteration(i, max_iterations));

            let response = driver.run_iteration(&mut conversation, &mut log).await;
            let record = log.finish_iteration(query, response);
            debug!(
                iteration = record.iteration,
                searches = record.search_queries.len(),
                fetches = record.content_retrievals.len(),
                "Iteration recorded"
            );

            if i < max_iterations {
                conversation.push_user_text(prompts::follow_up(query));
            }
        }

        self.progress.emit(ProgressEvent::final_report(
            "Generating comprehensive research report...",
        ));
        conversation.push_user_text(prompts::final_synthesis(query, max_iterations));

        match driver
            .complete(&conversation, Vec::new(), self.synthesis_max_tokens)
            .await
        {
            Ok(response) => {
                let report = response.text();
                info!(
                    query,
                    iterations = log.iterations().len(),
                    searches = log.search_history().len(),
                    report_chars = report.len(),
                    "Research complete"
                );
                self.progress.emit(ProgressEvent::info("Research complete!"));
                let session = log.into_session(query, &self.model_id, Ok(report.clone()));
                (report, session)
            }
            Err(e) => {
                error!(query, error = %e, "Final synthesis failed");
                self.progress.emit(ProgressEvent::error(format!(
                    "Error generating final report: {e}"
                )));
                let session = log.into_session(query, &self.model_id, Err(e.to_string()));
                (
                    format!("An error occurred while generating the final report: {e}"),
                    session,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use scholarloop_core::error::{ModelError, SearchError};
    use scholarloop_core::progress::ProgressKind;
    use serde_json::json;

    fn research_loop(model: Arc<ScriptedModel>, search: ScriptedSearch) -> ResearchLoop {
        ResearchLoop::new(
            model,
            Arc::new(search),
            Arc::new(ScriptedFetch::markdown("# Body")),
            "mock-model",
        )
    }

    /// One search-and-analyse iteration: two model calls.
    fn search_iteration(n: usize) -> Vec<Result<scholarloop_core::provider::ModelResponse, ModelError>> {
        vec![
            Ok(tool_use_response(
                &format!("toolu_{n}"),
                "web_search",
                json!({"query": format!("metformin angle {n}")}),
            )),
            Ok(text_response(&format!("Analysis {n}"))),
        ]
    }

    #[tokio::test]
    async fn produces_one_record_per_iteration() {
        for n in [3u32, 5] {
            let mut script = Vec::new();
            for i in 0..n {
                script.extend(search_iteration(i as usize));
            }
            script.push(Ok(text_response("# Report\n[source](https://example.org)")));
            let model = Arc::new(ScriptedModel::new(script));

            let (report, session) = research_loop(model, ScriptedSearch::articles(2))
                .run("metformin", n)
                .await;

            assert!(report.starts_with("# Report"));
            assert_eq!(session.iterations.len(), n as usize);
            assert_eq!(session.search_history.len(), n as usize);
            for (idx, it) in session.iterations.iter().enumerate() {
                assert_eq!(it.iteration, idx as u32 + 1);
                assert_eq!(it.search_queries.len(), 1);
                assert_eq!(it.response, format!("Analysis {idx}"));
            }
        }
    }

    #[tokio::test]
    async fn follow_up_prompts_and_synthesis_request() {
        let mut script = Vec::new();
        for i in 0..3 {
            script.extend(search_iteration(i));
        }
        script.push(Ok(text_response("report")));
        let model = Arc::new(ScriptedModel::new(script));

        research_loop(model.clone(), ScriptedSearch::articles(1))
            .with_synthesis_max_tokens(8192)
            .run("metformin", 3)
            .await;

        let requests = model.requests();
        assert_eq!(requests.len(), 7);
        let last = requests.last().unwrap();
        assert!(last.tools.is_empty());
        assert_eq!(last.max_tokens, 8192);
        let final_prompt = last.messages.last().unwrap().text();
        assert!(final_prompt.starts_with("We've completed 3 iterations"));

        let follow_ups = last
            .messages
            .iter()
            .filter(|m| m.text().contains("Identify a key gap"))
            .count();
        assert_eq!(follow_ups, 2);
    }

    #[tokio::test]
    async fn synthesis_failure_keeps_iterations() {
        let mut script = Vec::new();
        for i in 0..3 {
            script.extend(search_iteration(i));
        }
        script.push(Err(ModelError::ApiError {
            status_code: 529,
            message: "Overloaded".into(),
        }));
        let model = Arc::new(ScriptedModel::new(script));

        let (report, session) = research_loop(model, ScriptedSearch::articles(1))
            .run("metformin", 3)
            .await;

        assert!(report.starts_with("An error occurred while generating the final report: "));
        assert!(report.contains("Overloaded"));
        assert_eq!(session.iterations.len(), 3);
        assert!(session.final_report.is_none());
        assert!(session.error.as_deref().unwrap().contains("Overloaded"));
        assert!(!session.is_complete());
    }

    #[tokio::test]
    async fn failing_search_never_aborts() {
        let mut script = Vec::new();
        for i in 0..3 {
            script.extend(search_iteration(i));
        }
        script.push(Ok(text_response("Nothing could be found.")));
        let model = Arc::new(ScriptedModel::new(script));

        let (report, session) = research_loop(
            model,
            ScriptedSearch::failing(SearchError::Provider("connection refused".into())),
        )
        .run("metformin", 3)
        .await;

        assert!(!report.is_empty());
        assert_eq!(session.search_history.len(), 3);
        assert!(session
            .search_history
            .iter()
            .all(|s| s.num_results == 0 && s.error.is_some()));
    }

    #[tokio::test]
    async fn iteration_events_carry_counters() {
        let mut script = Vec::new();
        for _ in 0..3 {
            script.push(Ok(text_response("Thinking.")));
        }
        script.push(Ok(text_response("report")));
        let model = Arc::new(ScriptedModel::new(script));
        let events = RecordingProgress::default();

        research_loop(model, ScriptedSearch::articles(1))
            .with_progress(Arc::new(events.clone()))
            .run("metformin", 3)
            .await;

        let counters: Vec<(u32, u32)> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Iteration { iteration, total, .. } => Some((*iteration, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(counters, vec![(1, 3), (2, 3), (3, 3)]);

        let kinds = events.kinds();
        let final_idx = kinds.iter().position(|k| *k == ProgressKind::FinalReport).unwrap();
        let last_iter = kinds.iter().rposition(|k| *k == ProgressKind::Iteration).unwrap();
        assert!(final_idx > last_iter);
    }

    #[tokio::test]
    async fn from_config_uses_configured_budgets() {
        let config = AppConfig {
            iteration_max_tokens: 2000,
            synthesis_max_tokens: 6000,
            ..AppConfig::default()
        };
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(text_response("Planning.")),
            Ok(text_response("Report.")),
        ]));
        let research = ResearchLoop::from_config(
            &config,
            model.clone(),
            Arc::new(ScriptedSearch::articles(1)),
            Arc::new(ScriptedFetch::markdown("x")),
        );
        assert_eq!(research.model_id(), config.model);

        research.run("metformin", 1).await;
        let requests = model.requests();
        assert_eq!(requests[0].max_tokens, 2000);
        assert_eq!(requests[1].max_tokens, 6000);
        assert_eq!(requests[0].model, config.model);
    }
}
