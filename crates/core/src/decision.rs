//! Decision types: the policy authority's verdict on a proposal.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The verdict code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Allow,
    Warn,
    Throttle,
    Deny,
    Stop,
}

impl DecisionKind {
    /// DENY and STOP block the action; everything else lets it run.
    pub fn is_denial(self) -> bool {
        matches!(self, DecisionKind::Deny | DecisionKind::Stop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionKind::Allow => "ALLOW",
            DecisionKind::Warn => "WARN",
            DecisionKind::Throttle => "THROTTLE",
            DecisionKind::Deny => "DENY",
            DecisionKind::Stop => "STOP",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model selection hint attached to THROTTLE decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPolicy {
    Normal,
    Cheap,
    Throttled,
    #[serde(other)]
    Unknown,
}

/// A machine-readable reason entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reason {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// An advisory warning attached to a decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Operator guidance returned alongside a decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Throttling constraints attached to a THROTTLE decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThrottleInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_parallel_tasks: u32,

    #[serde(default, deserialize_with = "policy_or_none", skip_serializing_if = "Option::is_none")]
    pub model_policy: Option<ModelPolicy>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tool_restrictions: Vec<String>,
}

/// The response to one proposal. Lives for the duration of one guarded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Missing on the wire means DENY.
    #[serde(default = "default_decision")]
    pub decision: DecisionKind,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_policy: Option<ModelPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<ThrottleInfo>,

    /// Opaque budget status, passed through for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Reason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_event_id: Option<String>,
}

fn default_decision() -> DecisionKind {
    DecisionKind::Deny
}

/// `null` deserialises as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An empty or null policy string means no policy.
fn policy_or_none<'de, D>(deserializer: D) -> Result<Option<ModelPolicy>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|p| !p.is_empty()).map(|p| {
        serde_json::from_value(serde_json::Value::String(p)).unwrap_or(ModelPolicy::Unknown)
    }))
}

impl Decision {
    pub fn new(decision: DecisionKind, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
            model_policy: None,
            throttle: None,
            budget: None,
            reasons: Vec::new(),
            recommendation: None,
            warnings: Vec::new(),
            execution_token: None,
            ledger_event_id: None,
        }
    }

    pub fn allow() -> Self {
        Self::new(DecisionKind::Allow, "")
    }

    pub fn with_model_policy(mut self, policy: ModelPolicy) -> Self {
        self.model_policy = Some(policy);
        self
    }

    pub fn is_denial(&self) -> bool {
        self.decision.is_denial()
    }

    pub fn with_throttle(mut self, throttle: ThrottleInfo) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// The model policy hint, top-level first, then the nested throttle block.
    pub fn effective_model_policy(&self) -> Option<ModelPolicy> {
        self.model_policy
            .or_else(|| self.throttle.as_ref().and_then(|t| t.model_policy))
    }

    /// Whether the authority asked for the cheap-model treatment.
    pub fn wants_cheap_model(&self) -> bool {
        self.effective_model_policy() == Some(ModelPolicy::Cheap)
    }
}
