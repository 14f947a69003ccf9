//! Proposal documents and the builders that produce them.
//!
//! A proposal describes one action attempt before it runs. Builders here
//! are pure: they never fail and never touch their inputs. Every optional
//! parameter resolves to a fixed default.

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};
use crate::message::Message;
use crate::tool::ToolArgs;

/// Currency every cost estimate is expressed in.
pub const COST_CURRENCY: &str = "GBP";

/// Action type tag for model calls.
pub const LLM_CALL_ACTION: &str = "llm.call";

/// Prefix of the action type tag for tool calls.
pub const TOOL_CALL_ACTION_PREFIX: &str = "tool.call.";

/// Cost model tag used for tool executions.
pub const TOOL_COST_MODEL: &str = "tool-execution";

/// Open key/value metadata attached to a proposal.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// One action attempt submitted for authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub agent_id: String,
    pub session_id: String,
    pub intent: Intent,
    pub action: Action,
    pub cost: Cost,
    pub context: ProposalContext,

    /// Exception grant obtained after an earlier denial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// `"llm.call"` or `"tool.call.<name>"`.
    #[serde(rename = "type")]
    pub action_type: String,
    pub target: serde_json::Map<String, serde_json::Value>,
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub currency: String,
    pub estimated_gbp: f64,
    pub estimated_tokens: u64,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalContext {
    pub tool: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
    /// Optional action hash used by the authority for loop detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Proposal {
    pub fn with_resolution_token(mut self, token: impl Into<String>) -> Self {
        self.resolution_token = Some(token.into());
        self
    }

    pub fn with_goal_id(mut self, goal_id: impl Into<String>) -> Self {
        self.intent.goal_id = Some(goal_id.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.context.hash = Some(hash.into());
        self
    }

    /// Check the invariants every submitted proposal must satisfy.
    pub fn validate(&self) -> GuardResult<()> {
        if self.agent_id.trim().is_empty() {
            return Err(GuardError::InvalidProposal("agent_id must not be empty".into()));
        }
        if self.session_id.trim().is_empty() {
            return Err(GuardError::InvalidProposal("session_id must not be empty".into()));
        }
        if self.action.action_type.is_empty() {
            return Err(GuardError::InvalidProposal("action.type must not be empty".into()));
        }
        Ok(())
    }
}

/// Naive token estimate: characters of all message contents joined with
/// single spaces, divided by four.
pub fn estimate_tokens(messages: &[Message]) -> u64 {
    let content_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    let separators = messages.len().saturating_sub(1);
    ((content_chars + separators) / 4) as u64
}

/// Build the proposal for a model call.
pub fn build_model_call_proposal(
    agent_id: &str,
    session_id: &str,
    model: &str,
    messages: &[Message],
    est_tokens: Option<u64>,
    est_gbp: Option<f64>,
    meta: Option<Meta>,
) -> Proposal {
    let estimated_tokens = est_tokens.unwrap_or_else(|| estimate_tokens(messages));

    let mut target = serde_json::Map::new();
    target.insert("model".into(), model.into());
    target.insert("message_count".into(), messages.len().into());

    let mut inputs = serde_json::Map::new();
    inputs.insert(
        "messages".into(),
        serde_json::to_value(messages).unwrap_or_default(),
    );

    Proposal {
        agent_id: agent_id.to_string(),
        session_id: session_id.to_string(),
        intent: Intent {
            title: format!("LLM call: {model}"),
            goal_id: None,
        },
        action: Action {
            action_type: LLM_CALL_ACTION.to_string(),
            target,
            inputs,
        },
        cost: Cost {
            currency: COST_CURRENCY.to_string(),
            estimated_gbp: est_gbp.unwrap_or(0.0),
            estimated_tokens,
            model: model.to_string(),
        },
        context: ProposalContext {
            tool: "llm".into(),
            tags: vec!["llm".into(), "ai".into()],
            meta: meta.unwrap_or_default(),
            hash: None,
        },
        resolution_token: None,
    }
}

/// Build the proposal for a tool call. The arguments are the target.
pub fn build_tool_call_proposal(
    agent_id: &str,
    session_id: &str,
    tool_name: &str,
    args: &ToolArgs,
    est_tokens: Option<u64>,
    est_gbp: Option<f64>,
    meta: Option<Meta>,
) -> Proposal {
    Proposal {
        agent_id: agent_id.to_string(),
        session_id: session_id.to_string(),
        intent: Intent {
            title: format!("Tool call: {tool_name}"),
            goal_id: None,
        },
        action: Action {
            action_type: format!("{TOOL_CALL_ACTION_PREFIX}{tool_name}"),
            target: args.clone(),
            inputs: serde_json::Map::new(),
        },
        cost: Cost {
            currency: COST_CURRENCY.to_string(),
            estimated_gbp: est_gbp.unwrap_or(0.0),
            estimated_tokens: est_tokens.unwrap_or(0),
            model: TOOL_COST_MODEL.to_string(),
        },
        context: ProposalContext {
            tool: tool_name.to_string(),
            tags: vec!["tool".into(), tool_name.to_string()],
            meta: meta.unwrap_or_default(),
            hash: None,
        },
        resolution_token: None,
    }
}
