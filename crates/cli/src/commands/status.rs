//! `ctrldot-guard status`: Show the resolved configuration.

use ctrldot_config::GuardConfig;

use super::{load_config, Overrides};

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let unset = "(not set)";

    println!("Ctrl Dot Guard Status");
    println!("=====================");
    println!("  Config file:  {}", GuardConfig::config_path().display());
    println!("  Daemon URL:   {}", config.base_url);
    println!(
        "  Auth token:   {}",
        if config.auth_token.is_some() { "[REDACTED]" } else { unset }
    );
    println!("  Timeout:      {}s", config.timeout_secs);
    println!("  Agent:        {}", config.agent.agent_id.as_deref().unwrap_or(unset));
    println!("  Session:      {}", config.agent.session_id.as_deref().unwrap_or(unset));
    println!("  Cheap model:  {}", config.agent.cheap_model.as_deref().unwrap_or(unset));

    if GuardConfig::config_path().exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ℹ️  No config file, using defaults and environment");
    }

    Ok(())
}
