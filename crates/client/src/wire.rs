//! Wire types for the policy authority API and the mapping of non-2xx
//! responses onto [`GuardError`].

use chrono::{DateTime, Utc};
use ctrldot_core::{DecisionKind, GuardError};
use serde::{Deserialize, Serialize};

/// Placeholder used when an error response carries no body at all.
pub const NO_BODY: &str = "(no body)";

/// Body of `POST /v1/agents/register`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RegisterAgentRequest<'a> {
    pub agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<&'a str>,
}

/// Body of `POST /v1/sessions/start`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StartSessionRequest<'a> {
    pub agent_id: &'a str,
    pub metadata: &'a serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /v1/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A logical run of an agent, as tracked by the policy authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Map a non-success HTTP status and its body onto a [`GuardError`].
///
/// 403 with a JSON object body is a denial. 400 is a denial only when the
/// body carries a `decision` field; otherwise it is an ordinary validation
/// failure. Everything else is a protocol error carrying the body's `error`
/// field, the raw body, or [`NO_BODY`], in that order.
pub fn error_from_status(status: u16, body: &str) -> GuardError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let object = parsed.as_ref().and_then(|v| v.as_object());

    if let Some(obj) = object {
        let denial_shaped = match status {
            403 => true,
            400 => obj.contains_key("decision"),
            _ => false,
        };

        if denial_shaped {
            let decision = obj
                .get("decision")
                .and_then(|d| serde_json::from_value::<DecisionKind>(d.clone()).ok())
                .filter(|d| d.is_denial())
                .unwrap_or(DecisionKind::Deny);
            let reason = obj
                .get("reason")
                .or_else(|| obj.get("error"))
                .and_then(|r| r.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return GuardError::Denied { decision, reason };
        }
    }

    let message = object
        .and_then(|obj| obj.get("error"))
        .and_then(|e| e.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                NO_BODY.to_string()
            } else {
                body.to_string()
            }
        });

    GuardError::Protocol { status, message }
}
