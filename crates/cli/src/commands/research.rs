//! `scholarloop research`: Run a literature review and export the results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use scholarloop_agent::ResearchLoop;
use scholarloop_config::AppConfig;
use scholarloop_core::progress::{ProgressBus, ProgressEvent};
use scholarloop_core::session::ResearchSession;
use scholarloop_tools::{ExaSearch, FirecrawlFetch};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

pub struct ResearchArgs {
    pub query: String,
    pub iterations: Option<u32>,
    pub model: Option<String>,
    pub results: Option<u32>,
    pub output_dir: Option<PathBuf>,
}

pub async fn run(args: ResearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load_unvalidated().map_err(|e| format!("Failed to load config: {e}"))?;
    apply_overrides(&mut config, &args)?;

    let missing = config.missing_keys();
    if !missing.is_empty() {
        eprintln!();
        eprintln!("  ERROR: Missing API keys: {}", missing.join(", "));
        eprintln!();
        eprintln!("  Set them as environment variables or add them to:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("API keys missing. Run `scholarloop doctor` for details.".into());
    }

    let query = args.query.trim();
    if query.is_empty() {
        return Err("Research query must not be empty".into());
    }

    let bus = Arc::new(ProgressBus::default());
    let renderer = tokio::spawn(render_progress(bus.subscribe()));

    let research = ResearchLoop::from_config(
        &config,
        scholarloop_providers::build_from_config(&config),
        Arc::new(ExaSearch::from_config(&config.exa, &config.search)),
        Arc::new(FirecrawlFetch::from_config(&config.firecrawl)),
    )
    .with_progress(bus.clone());

    let (report, session) = research.run(query, config.max_iterations).await;

    // Closing the bus ends the renderer once it has drained.
    drop(research);
    drop(bus);
    let _ = renderer.await;

    println!("{report}");

    let dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let (report_path, data_path) = write_exports(&dir, &report, &session, Local::now())?;
    eprintln!();
    eprintln!("  Report:        {}", report_path.display());
    eprintln!("  Research data: {}", data_path.display());

    if !session.is_complete() {
        return Err("Research finished without a final report. See the research data file.".into());
    }
    Ok(())
}

fn apply_overrides(
    config: &mut AppConfig,
    args: &ResearchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(n) = args.iterations {
        config.max_iterations = n;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(n) = args.results {
        config.results_per_search = n;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(())
}

async fn render_progress(mut rx: tokio::sync::broadcast::Receiver<ProgressEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => eprintln!("{}", render_event(&event)),
            Err(RecvError::Lagged(skipped)) => {
                eprintln!("  ... {skipped} progress updates skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// One terminal line per progress event.
pub fn render_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Iteration {
            iteration, total, ..
        } => format!(
            "[iteration {iteration}/{total}] {:>3}% {}",
            (event.fraction().unwrap_or(0.0) * 100.0).round() as u32,
            event.message()
        ),
        _ => format!("[{}] {}", event.kind(), event.message()),
    }
}

/// Write `research_report_<ts>.md` and `research_data_<ts>.json` into `dir`.
pub fn write_exports(
    dir: &Path,
    report: &str,
    session: &ResearchSession,
    now: DateTime<Local>,
) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let stamp = now.format("%Y%m%d_%H%M%S");

    let report_path = dir.join(format!("research_report_{stamp}.md"));
    std::fs::write(&report_path, report)?;

    let data_path = dir.join(format!("research_data_{stamp}.json"));
    std::fs::write(&data_path, session.to_json_pretty()?)?;

    info!(report = %report_path.display(), data = %data_path.display(), "Exported research results");
    Ok((report_path, data_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scholarloop_core::session::ResearchLog;

    fn args() -> ResearchArgs {
        ResearchArgs {
            query: "metformin".into(),
            iterations: None,
            model: None,
            results: None,
            output_dir: None,
        }
    }

    #[test]
    fn overrides_are_validated() {
        let mut config = AppConfig::default();
        let err = apply_overrides(
            &mut config,
            &ResearchArgs {
                iterations: Some(20),
                ..args()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_iterations"));

        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            &ResearchArgs {
                iterations: Some(5),
                results: Some(8),
                model: Some("claude-3-5-haiku-20241022".into()),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.results_per_search, 8);
        assert_eq!(config.model, "claude-3-5-haiku-20241022");
    }

    #[test]
    fn flag_rescues_out_of_bounds_environment() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| (key == "SCHOLARLOOP_MAX_ITERATIONS").then(|| "20".to_string()))
            .unwrap();
        assert_eq!(config.max_iterations, 20);

        apply_overrides(
            &mut config,
            &ResearchArgs {
                iterations: Some(5),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(config.max_iterations, 5);
    }

    #[test]
    fn iteration_line_shows_counters() {
        let line = render_event(&ProgressEvent::iteration(2, 4));
        assert_eq!(line, "[iteration 2/4]  50% Research iteration 2/4");
        let line = render_event(&ProgressEvent::search("Searching for: metformin"));
        assert_eq!(line, "[search] Searching for: metformin");
    }

    #[test]
    fn exports_report_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ResearchLog::new();
        log.finish_iteration("metformin", "analysis".into());
        let session = log.into_session("metformin", "mock", Ok("# Report".into()));
        let now = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();

        let (report, data) = write_exports(dir.path(), "# Report", &session, now).unwrap();
        assert_eq!(report.file_name().unwrap(), "research_report_20250314_092653.md");
        assert_eq!(data.file_name().unwrap(), "research_data_20250314_092653.json");
        assert_eq!(std::fs::read_to_string(report).unwrap(), "# Report");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(data).unwrap()).unwrap();
        assert_eq!(json["query"], "metformin");
        assert_eq!(json["iterations"].as_array().unwrap().len(), 1);
    }
}
