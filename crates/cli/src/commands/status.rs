//! `scholarloop status`: Show the effective configuration.

use scholarloop_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let key = |set: bool| if set { "set" } else { "missing" };

    println!("ScholarLoop Status");
    println!("==================");
    println!("  Config file:        {}", AppConfig::config_path().display());
    println!("  Model:              {}", config.model);
    println!("  Iterations:         {}", config.max_iterations);
    println!("  Results/search:     {}", config.results_per_search);
    println!("  Iteration tokens:   {}", config.iteration_max_tokens);
    println!("  Synthesis tokens:   {}", config.synthesis_max_tokens);
    println!(
        "  Search:             {} / {} ({} chars per result)",
        config.search.search_type, config.search.category, config.search.max_characters
    );
    println!(
        "  Output dir:         {}",
        config
            .output_dir
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".into())
    );
    println!("  Anthropic key:      {}", key(config.anthropic.api_key.is_some()));
    println!("  Exa key:            {}", key(config.exa.api_key.is_some()));
    println!("  Firecrawl key:      {}", key(config.firecrawl.api_key.is_some()));
    Ok(())
}
