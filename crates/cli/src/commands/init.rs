//! `scholarloop init`: Write a default config file.

use scholarloop_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("ScholarLoop Setup");
    println!("===================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Created config.toml at: {}", config_path.display());
    println!("\n  Next steps:");
    println!("    1. Set ANTHROPIC_API_KEY, EXA_API_KEY and FIRECRAWL_API_KEY");
    println!("       (or add api_key under [anthropic], [exa], [firecrawl])");
    println!("    2. Run: scholarloop doctor");
    println!("    3. Run: scholarloop research \"your topic\"");
    Ok(())
}
