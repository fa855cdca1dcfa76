//! Scripted capability doubles for driver and loop tests.

use std::sync::{Arc, Mutex};

use scholarloop_core::capability::{ContentFetch, PaperSearch, SearchQuery};
use scholarloop_core::error::{FetchError, ModelError, SearchError};
use scholarloop_core::message::ContentBlock;
use scholarloop_core::progress::{ProgressEvent, ProgressKind, ProgressSink};
use scholarloop_core::provider::{CompletionRequest, ConversationModel, ModelResponse, Usage};

/// A model that returns scripted results in sequence.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedModel {
    responses: Mutex<Vec<Result<ModelResponse, ModelError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<ModelResponse, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConversationModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<ModelResponse, ModelError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let idx = requests.len();
        if idx >= responses.len() {
            panic!(
                "ScriptedModel: no more responses (call #{}, have {})",
                idx,
                responses.len()
            );
        }
        requests.push(request);
        responses[idx].clone()
    }
}

pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        content: vec![ContentBlock::text(text)],
        model: "mock-model".into(),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        stop_reason: Some("end_turn".into()),
    }
}

pub fn tool_use_response(id: &str, name: &str, input: serde_json::Value) -> ModelResponse {
    ModelResponse {
        content: vec![
            ContentBlock::text("Let me look into that."),
            ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            },
        ],
        model: "mock-model".into(),
        usage: None,
        stop_reason: Some("tool_use".into()),
    }
}

/// Search double returning `n` articles, or always failing.
pub struct ScriptedSearch {
    outcome: Result<serde_json::Value, SearchError>,
}

impl ScriptedSearch {
    pub fn articles(n: usize) -> Self {
        let results: Vec<serde_json::Value> = (1..=n)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Paper {i}"),
                    "url": format!("https://example.org/paper-{i}"),
                    "publishedDate": "2022-06-01",
                    "text": "Abstract text."
                })
            })
            .collect();
        Self {
            outcome: Ok(serde_json::json!({ "results": results })),
        }
    }

    pub fn failing(error: SearchError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait::async_trait]
impl PaperSearch for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, _query: &SearchQuery) -> Result<serde_json::Value, SearchError> {
        self.outcome.clone()
    }
}

pub struct ScriptedFetch {
    outcome: Result<serde_json::Value, FetchError>,
}

impl ScriptedFetch {
    pub fn markdown(text: &str) -> Self {
        Self {
            outcome: Ok(serde_json::json!({ "markdown": text })),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait::async_trait]
impl ContentFetch for ScriptedFetch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _url: &str) -> Result<serde_json::Value, FetchError> {
        self.outcome.clone()
    }
}

/// Progress sink that keeps every event.
#[derive(Clone, Default)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<ProgressKind> {
        self.events().iter().map(ProgressEvent::kind).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
