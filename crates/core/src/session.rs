//! Research records and the session aggregate.
//!
//! Every search and fetch attempt leaves a record, success or failure. Records
//! are grouped into iterations by timestamp: an iteration owns the records
//! stamped after the previous iteration finished. The [`ResearchSession`] is
//! the exportable snapshot of a whole run.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::SearchQuery;

/// One search attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub num_results: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One full-text retrieval attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Characters recovered before truncation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One finished turn of the research loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based
    pub iteration: u32,
    pub query: String,
    pub response: String,
    pub search_queries: Vec<SearchRecord>,
    pub content_retrievals: Vec<FetchRecord>,
    /// When the iteration completed
    pub timestamp: DateTime<Utc>,
}

/// Everything a run produced.
///
/// `final_report` is set on success; `error` is set when final synthesis
/// failed and the session is a partial snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    pub query: String,
    pub model: String,
    pub iterations: Vec<IterationRecord>,
    pub search_history: Vec<SearchRecord>,
    pub content_retrieval_history: Vec<FetchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the run terminated
    pub timestamp: DateTime<Utc>,
}

impl ResearchSession {
    /// Did the run finish with a synthesized report?
    pub fn is_complete(&self) -> bool {
        self.final_report.is_some() && self.error.is_none()
    }

    /// Pretty JSON for file export.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn failed_searches(&self) -> usize {
        self.search_history.iter().filter(|s| !s.succeeded()).count()
    }
}

/// The session log a run builds up.
///
/// Owns the search/fetch histories and the finished iterations. All
/// timestamps are handed out by [`ResearchLog::stamp`], which never repeats or
/// goes backwards, so "stamped after the previous iteration" is a strict and
/// exact partition of the histories.
#[derive(Debug, Clone, Default)]
pub struct ResearchLog {
    search_history: Vec<SearchRecord>,
    content_retrieval_history: Vec<FetchRecord>,
    iterations: Vec<IterationRecord>,
    last_stamp: Option<DateTime<Utc>>,
}

impl ResearchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timestamp strictly later than every one handed out before.
    pub fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(ts);
        ts
    }

    /// Append a search attempt.
    pub fn record_search(
        &mut self,
        query: &SearchQuery,
        num_results: usize,
        error: Option<String>,
    ) -> &SearchRecord {
        let timestamp = self.stamp();
        self.search_history.push(SearchRecord {
            query: query.query.clone(),
            start_date: query.start_date.clone(),
            end_date: query.end_date.clone(),
            timestamp,
            num_results,
            error,
        });
        &self.search_history[self.search_history.len() - 1]
    }

    /// Append a fetch attempt. `Ok` carries the recovered length.
    pub fn record_fetch(&mut self, url: &str, outcome: Result<usize, String>) -> &FetchRecord {
        let timestamp = self.stamp();
        let (success, content_length, error) = match outcome {
            Ok(len) => (true, Some(len), None),
            Err(e) => (false, None, Some(e)),
        };
        self.content_retrieval_history.push(FetchRecord {
            url: url.to_string(),
            timestamp,
            success,
            content_length,
            error,
        });
        &self.content_retrieval_history[self.content_retrieval_history.len() - 1]
    }

    /// Close the current iteration.
    ///
    /// The iteration takes every record stamped after the previous iteration
    /// (all records, for the first one) and gets the next 1-based index.
    pub fn finish_iteration(&mut self, query: &str, response: String) -> &IterationRecord {
        let since = self.iterations.last().map(|it| it.timestamp);
        let after = |ts: &DateTime<Utc>| since.is_none_or(|prev| *ts > prev);

        let search_queries = self
            .search_history
            .iter()
            .filter(|s| after(&s.timestamp))
            .cloned()
            .collect();
        let content_retrievals = self
            .content_retrieval_history
            .iter()
            .filter(|c| after(&c.timestamp))
            .cloned()
            .collect();

        let timestamp = self.stamp();
        self.iterations.push(IterationRecord {
            iteration: self.iterations.len() as u32 + 1,
            query: query.to_string(),
            response,
            search_queries,
            content_retrievals,
            timestamp,
        });
        &self.iterations[self.iterations.len() - 1]
    }

    pub fn search_history(&self) -> &[SearchRecord] {
        &self.search_history
    }

    pub fn content_retrieval_history(&self) -> &[FetchRecord] {
        &self.content_retrieval_history
    }

    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    /// Freeze the log into a session snapshot.
    pub fn into_session(
        mut self,
        query: &str,
        model: &str,
        outcome: Result<String, String>,
    ) -> ResearchSession {
        let timestamp = self.stamp();
        let (final_report, error) = match outcome {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e)),
        };
        ResearchSession {
            query: query.to_string(),
            model: model.to_string(),
            iterations: self.iterations,
            search_history: self.search_history,
            content_retrieval_history: self.content_retrieval_history,
            final_report,
            error,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> ResearchSession {
        let now = Utc::now();
        let search = SearchRecord {
            query: "metformin liver".into(),
            start_date: None,
            end_date: Some("2024-01-01T00:00:00.000Z".into()),
            timestamp: now,
            num_results: 5,
            error: None,
        };
        let fetch = FetchRecord {
            url: "https://example.org/paper".into(),
            timestamp: now,
            success: false,
            content_length: None,
            error: Some("timeout".into()),
        };
        ResearchSession {
            query: "effects of metformin on liver health".into(),
            model: "claude-sonnet-4-20250514".into(),
            iterations: vec![IterationRecord {
                iteration: 1,
                query: "effects of metformin on liver health".into(),
                response: "Found five papers.".into(),
                search_queries: vec![search.clone()],
                content_retrievals: vec![fetch.clone()],
                timestamp: now,
            }],
            search_history: vec![search],
            content_retrieval_history: vec![fetch],
            final_report: Some("# Report".into()),
            error: None,
            timestamp: now,
        }
    }

    #[test]
    fn session_json_uses_export_field_names() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_session().to_json_pretty().unwrap()).unwrap();
        for key in [
            "query",
            "model",
            "iterations",
            "search_history",
            "content_retrieval_history",
            "final_report",
            "timestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("error").is_none());

        let iteration = &json["iterations"][0];
        assert_eq!(iteration["iteration"], 1);
        assert!(iteration["search_queries"].is_array());
        assert!(iteration["content_retrievals"].is_array());
        assert_eq!(json["search_history"][0]["num_results"], 5);
        assert_eq!(json["content_retrieval_history"][0]["success"], false);
    }

    #[test]
    fn partial_session_is_not_complete() {
        let mut session = sample_session();
        assert!(session.is_complete());
        session.final_report = None;
        session.error = Some("overloaded".into());
        assert!(!session.is_complete());
    }

    fn query(q: &str) -> SearchQuery {
        SearchQuery {
            query: q.into(),
            num_results: 5,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn stamps_strictly_increase() {
        let mut log = ResearchLog::new();
        let mut prev = log.stamp();
        for _ in 0..1000 {
            let next = log.stamp();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn iterations_partition_the_histories() {
        let mut log = ResearchLog::new();

        log.record_search(&query("metformin liver"), 5, None);
        log.record_fetch("https://example.org/a", Ok(1200));
        log.finish_iteration("q", "first".into());

        log.finish_iteration("q", "nothing searched".into());

        log.record_search(&query("metformin NAFLD"), 0, Some("HTTP 500".into()));
        log.record_search(&query("metformin fibrosis"), 3, None);
        log.record_fetch("https://example.org/b", Err("timeout".into()));
        log.finish_iteration("q", "third".into());

        let its = log.iterations();
        assert_eq!(its.iter().map(|i| i.iteration).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(its[0].search_queries.len(), 1);
        assert_eq!(its[0].content_retrievals.len(), 1);
        assert!(its[1].search_queries.is_empty());
        assert!(its[1].content_retrievals.is_empty());
        assert_eq!(its[2].search_queries.len(), 2);
        assert_eq!(its[2].content_retrievals.len(), 1);

        let attributed: usize = its.iter().map(|i| i.search_queries.len()).sum();
        assert_eq!(attributed, log.search_history().len());
        let attributed: usize = its.iter().map(|i| i.content_retrievals.len()).sum();
        assert_eq!(attributed, log.content_retrieval_history().len());
    }

    #[test]
    fn fetch_outcome_maps_to_record() {
        let mut log = ResearchLog::new();
        let ok = log.record_fetch("https://example.org/a", Ok(42)).clone();
        assert!(ok.success);
        assert_eq!(ok.content_length, Some(42));
        let failed = log.record_fetch("https://example.org/b", Err("404".into())).clone();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("404"));
    }

    #[test]
    fn into_session_carries_outcome() {
        let mut log = ResearchLog::new();
        log.record_search(&query("metformin"), 2, None);
        log.finish_iteration("metformin", "analysis".into());
        let last = log.iterations()[0].timestamp;

        let session = log.clone().into_session("metformin", "mock", Ok("# Report".into()));
        assert!(session.is_complete());
        assert!(session.timestamp > last);

        let partial = log.into_session("metformin", "mock", Err("overloaded".into()));
        assert_eq!(partial.error.as_deref(), Some("overloaded"));
        assert_eq!(partial.iterations.len(), 1);
    }

    #[test]
    fn failed_search_count() {
        let mut session = sample_session();
        assert_eq!(session.failed_searches(), 0);
        session.search_history[0].error = Some("HTTP 500".into());
        assert_eq!(session.failed_searches(), 1);
    }
}
