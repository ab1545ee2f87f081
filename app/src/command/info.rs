use policyqa_config::{API_KEY_ENV, Config};
use std::path::PathBuf;

use super::{history_config, load_config};

/// Strategy for displaying configuration information.
///
/// Prints server, model and conversation settings plus the configured
/// usernames. The API key is masked and password hashes are never shown.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = load_config(config_path.as_deref())?;
        print_summary(&config);

        if let Err(e) = config.validate() {
            println!("\nWarning: {e}");
        }
        Ok(())
    }
}

fn print_summary(config: &Config) {
    println!("=== policyqa Configuration ===\n");

    println!("Server:");
    println!("  Bind: {}", config.server.bind);
    println!("  Secure Cookies: {}", config.server.secure_cookies);
    println!("  Session TTL: {} min", config.server.session_ttl_minutes);
    println!(
        "  Cleanup Interval: {}s",
        config.server.cleanup_interval_seconds
    );
    println!("  Max Upload: {} bytes", config.server.max_upload_bytes);
    println!();

    println!("LLM:");
    println!("  Provider: {}", config.llm.provider.label());
    println!("  API Key: {}", mask_secret(&config.llm.api_key));
    if std::env::var(API_KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        println!("  (overridden by {API_KEY_ENV})");
    }
    println!(
        "  Model: {}",
        config.llm.model.as_deref().unwrap_or("(provider default)")
    );
    if let Some(ref base_url) = config.llm.base_url {
        println!("  Base URL: {base_url}");
    }
    println!("  Timeout: {}s", config.llm.timeout_secs);
    println!();

    let history = history_config(config);
    println!("Conversation:");
    println!("  History Window: {}", history.window_size);
    match history.max_stored_entries {
        Some(max) => println!("  Max Stored Entries: {max}"),
        None => println!("  Max Stored Entries: (unbounded)"),
    }
    if config.conversation.preamble.is_some() {
        println!("  Preamble: custom");
    }
    println!();

    println!("Users:");
    if config.users.is_empty() {
        println!("  (none)");
    }
    for user in &config.users {
        println!("  {}", user.username);
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
