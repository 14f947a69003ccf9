//! `ctrldot-guard propose`: Submit a tool-call proposal and print the decision.
//!
//! Denials are printed with the authority's reason and returned as errors,
//! so the process exits non-zero.

use ctrldot_config::GuardConfig;
use ctrldot_core::{build_tool_call_proposal, Decision, GuardError, ToolArgs};

use super::{client, load_config, Overrides};

/// Flags of the `propose` subcommand.
#[derive(Debug, Clone)]
pub struct ProposeArgs {
    pub tool_name: String,
    pub args: String,
    pub agent: Option<String>,
    pub session: Option<String>,
    pub resolution_token: Option<String>,
}

pub async fn run(overrides: &Overrides, flags: ProposeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let args = parse_args(&flags.args)?;
    let agent_id = resolve_agent(flags.agent, &config)?;
    let session_id = resolve_session(flags.session, &config);

    let mut proposal =
        build_tool_call_proposal(&agent_id, &session_id, &flags.tool_name, &args, None, None, None);
    if let Some(token) = flags.resolution_token {
        proposal = proposal.with_resolution_token(token);
    }

    match client(&config)?.propose_action(&proposal).await {
        Ok(decision) => {
            print_decision(&decision);
            Ok(())
        }
        Err(GuardError::Denied { decision, reason }) => {
            println!("⛔ {decision}: {reason}");
            println!("   Request a resolution token and retry with --resolution-token.");
            Err(GuardError::Denied { decision, reason }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse `--args` into keyword arguments. Must be a JSON object.
fn parse_args(raw: &str) -> Result<ToolArgs, Box<dyn std::error::Error>> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!("--args must be a JSON object, got {other}").into()),
    }
}

fn resolve_agent(
    flag: Option<String>,
    config: &GuardConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    flag.or_else(|| config.agent.agent_id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| "No agent id: pass --agent or set CTRLDOT_AGENT_ID".into())
}

fn resolve_session(flag: Option<String>, config: &GuardConfig) -> String {
    flag.or_else(|| config.agent.session_id.clone())
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn print_decision(decision: &Decision) {
    let icon = match decision.decision {
        ctrldot_core::DecisionKind::Allow => "✅",
        _ => "⚠️ ",
    };
    println!("{icon} {}", decision.decision);
    if !decision.reason.is_empty() {
        println!("   Reason: {}", decision.reason);
    }
    if let Some(policy) = decision.effective_model_policy() {
        println!("   Model policy: {policy:?}");
    }
    for warning in &decision.warnings {
        println!("   Warning [{}]: {}", warning.code, warning.message);
    }
    if let Some(rec) = &decision.recommendation {
        if let Some(title) = &rec.title {
            println!("   Recommendation: {title}");
        }
        for step in &rec.next_steps {
            println!("     - {step}");
        }
    }
}
