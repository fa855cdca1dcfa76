//! `scholarloop doctor`: Diagnose API keys and config.

use scholarloop_config::{AppConfig, KNOWN_MODELS};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("ScholarLoop Doctor: Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ok    Config file found at {}", config_path.display());
    } else {
        println!("  info  No config file, using defaults (run `scholarloop init` to create one)");
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Config valid");

            for name in ["ANTHROPIC_API_KEY", "EXA_API_KEY", "FIRECRAWL_API_KEY"] {
                if config.missing_keys().contains(&name) {
                    println!("  FAIL  {name} is not set");
                    issues += 1;
                } else {
                    println!("  ok    {name} is set");
                }
            }

            if !KNOWN_MODELS.contains(&config.model.as_str()) {
                println!("  warn  Model '{}' is not one of: {}", config.model, KNOWN_MODELS.join(", "));
            }
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }
    Ok(())
}
