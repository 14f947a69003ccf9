//! `ctrldot-guard budget`: Show an agent's budget status.

use super::{client, load_config, Overrides};

pub async fn run(
    overrides: &Overrides,
    agent_id: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let budget = client(&config)?.get_budget_status(agent_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&budget)?);
        return Ok(());
    }

    println!("📊 Budget: {agent_id}");
    println!("─────────────────────────────────────");
    if budget.is_empty() {
        println!("  No budget reported for this agent.");
        return Ok(());
    }
    for line in render(&budget) {
        println!("  {line}");
    }

    Ok(())
}

/// One `key: value` line per field, strings unquoted.
fn render(budget: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    budget
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{key}: {s}"),
            other => format!("{key}: {other}"),
        })
        .collect()
}
