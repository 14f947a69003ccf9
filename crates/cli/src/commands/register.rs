//! `ctrldot-guard register`: Register an agent.

use super::{client, load_config, Overrides};

pub async fn run(
    overrides: &Overrides,
    agent_id: &str,
    name: Option<String>,
    mode: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let mode = mode.or(config.agent.default_mode.clone());

    client(&config)?
        .register_agent(agent_id, name.as_deref(), mode.as_deref())
        .await?;

    println!("✅ Agent '{agent_id}' registered with {}", config.base_url);
    Ok(())
}
