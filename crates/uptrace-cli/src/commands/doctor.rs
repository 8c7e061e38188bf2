//! Diagnostics command.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use uptrace_core::client::UptraceClient;
use uptrace_core::MonitorTransport;

use crate::config::Config;
use crate::state::StateStore;

pub async fn execute(config: &Config, config_path: &Path) -> Result<()> {
    println!("{}", "uptrace-monitor Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file ({}): ", config_path.display());
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check state directory
    print!("  State directory: ");
    if config.paths.state_dir.exists() {
        match StateStore::new(&config.paths.state_dir).index() {
            Ok(index) => println!("{}", format!("✓ {} monitor(s) managed", index.len()).green()),
            Err(e) => {
                println!("{}", format!("✗ {}", e).red());
                issues.push("State index is unreadable".to_string());
            }
        }
    } else {
        println!("{}", "○ will be created".yellow());
    }

    // Check credentials
    print!("  Project id: ");
    match &config.api.project_id {
        Some(id) => println!("{}", id.as_str().green()),
        None => {
            println!("{}", "✗ not set".red());
            issues.push("Set api.project_id or UPTRACE_PROJECT_ID".to_string());
        }
    }
    print!("  API key: ");
    if config.api.api_key.is_some() {
        println!("{}", "✓ set".green());
    } else {
        println!("{}", "✗ not set".red());
        issues.push("Set api.api_key or UPTRACE_API_KEY".to_string());
    }

    // Check API connectivity
    print!("  API ({}):", config.api.url);
    match check_api(config).await {
        Ok(count) => println!(" {}", format!("✓ reachable, {} monitor(s)", count).green()),
        Err(e) => {
            println!(" {}", format!("✗ {}", e).red());
            issues.push("Cannot reach the Uptrace API".to_string());
        }
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}

async fn check_api(config: &Config) -> Result<usize> {
    let mut client_config = config.client_config()?;
    client_config.timeout = Duration::from_secs(5);
    client_config.retry.max_retries = 0;

    let client = UptraceClient::new(client_config)?;
    Ok(client.list().await?.len())
}
