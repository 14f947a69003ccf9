//! `ctrldot-guard doctor`: Check configuration and daemon reachability.

use ctrldot_config::GuardConfig;

use super::{client, Overrides};

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Ctrl Dot Guard Doctor");
    println!("========================\n");

    let mut issues = 0;

    let config = match GuardConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            issues += 1;
            GuardConfig::default()
        }
    }
    .with_overrides(overrides.url.clone(), overrides.token.clone());

    if let Err(e) = config.validate() {
        println!("  ❌ {e}");
        println!("\n  ⚠️  Cannot reach the daemon without a valid address.");
        return Ok(());
    }

    if config.auth_token.is_some() {
        println!("  ✅ Auth token configured");
    } else {
        println!("  ℹ️  No auth token (fine for a local daemon)");
    }

    if config.agent.agent_id.is_none() {
        println!("  ⚠️  No default agent id: set CTRLDOT_AGENT_ID or agent.agent_id");
        issues += 1;
    }

    match client(&config)?.health().await {
        Ok(health) if health.ok => match health.version {
            Some(v) => println!("  ✅ Daemon reachable at {} (v{v})", config.base_url),
            None => println!("  ✅ Daemon reachable at {}", config.base_url),
        },
        Ok(_) => {
            println!("  ❌ Daemon at {} reports unhealthy", config.base_url);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
