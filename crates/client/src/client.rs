//! The Ctrl Dot HTTP client.
//!
//! One `reqwest::Client` is shared by every call; requests carry no
//! cross-call state, so a `CtrlDotClient` can be cloned freely and used
//! from many tasks at once.

use async_trait::async_trait;
use ctrldot_config::GuardConfig;
use ctrldot_core::{Decision, GuardError, GuardResult, PolicyChannel, Proposal};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::wire::{error_from_status, Health, RegisterAgentRequest, Session, StartSessionRequest};

/// Default round-trip bound when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Ctrl Dot policy authority.
#[derive(Clone)]
pub struct CtrlDotClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for CtrlDotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrlDotClient")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CtrlDotClient {
    /// Create a client for the given address.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// Create a client from a resolved configuration.
    pub fn from_config(config: &GuardConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.clone(), config.auth_token.clone(), config.timeout())
    }

    /// Resolve address and token from `CTRLDOT_URL` / `CTRLDOT_AUTH_TOKEN`,
    /// with explicit values taking precedence.
    pub fn from_env(
        base_url: Option<String>,
        auth_token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let mut config = GuardConfig::default();
        config.apply_env();
        Self::from_config(&config.with_overrides(base_url, auth_token))
    }

    /// The configured policy authority address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register an agent. Registering an existing agent is not an error.
    pub async fn register_agent(
        &self,
        agent_id: &str,
        display_name: Option<&str>,
        default_mode: Option<&str>,
    ) -> GuardResult<()> {
        let body = RegisterAgentRequest {
            agent_id,
            display_name: display_name.filter(|s| !s.is_empty()),
            default_mode: default_mode.filter(|s| !s.is_empty()),
        };

        match self.send(self.post(&["v1", "agents", "register"])?.json(&body)).await {
            Ok(_) => {
                info!(agent_id, "Registered agent with Ctrl Dot");
                Ok(())
            }
            Err(GuardError::Protocol { status: 409, .. }) => {
                debug!(agent_id, "Agent already registered");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Propose an action and get a decision.
    ///
    /// DENY and STOP never come back as a `Decision`: they are returned as
    /// [`GuardError::Denied`] carrying the authority's reason.
    pub async fn propose_action(&self, proposal: &Proposal) -> GuardResult<Decision> {
        proposal.validate()?;

        debug!(
            agent_id = %proposal.agent_id,
            session_id = %proposal.session_id,
            action_type = %proposal.action.action_type,
            estimated_tokens = proposal.cost.estimated_tokens,
            "Proposing action"
        );

        let response = self
            .send(self.post(&["v1", "actions", "propose"])?.json(proposal))
            .await?;
        let decision: Decision = Self::parse_json(response).await?;

        debug!(
            action_type = %proposal.action.action_type,
            decision = %decision.decision,
            reason = %decision.reason,
            "Received decision"
        );

        if decision.is_denial() {
            return Err(GuardError::Denied {
                decision: decision.decision,
                reason: decision.reason,
            });
        }

        Ok(decision)
    }

    /// Budget status for an agent; empty when the authority reports none.
    pub async fn get_budget_status(
        &self,
        agent_id: &str,
    ) -> GuardResult<serde_json::Map<String, serde_json::Value>> {
        let response = self
            .send(self.get(&["v1", "agents", path_id(agent_id)?])?)
            .await?;
        let agent: serde_json::Value = Self::parse_json(response).await?;

        Ok(agent
            .get("budget")
            .and_then(|b| b.as_object())
            .cloned()
            .unwrap_or_default())
    }

    /// Liveness probe.
    pub async fn health(&self) -> GuardResult<Health> {
        let response = self.send(self.get(&["v1", "health"])?).await?;
        Self::parse_json(response).await
    }

    /// Open a session for an agent.
    pub async fn start_session(
        &self,
        agent_id: &str,
        metadata: &serde_json::Map<String, serde_json::Value>,
    ) -> GuardResult<Session> {
        let body = StartSessionRequest { agent_id, metadata };
        let response = self
            .send(self.post(&["v1", "sessions", "start"])?.json(&body))
            .await?;
        let session: Session = Self::parse_json(response).await?;
        info!(agent_id, session_id = %session.session_id, "Started session");
        Ok(session)
    }

    /// Close a session.
    pub async fn end_session(&self, session_id: &str) -> GuardResult<()> {
        let path = ["v1", "sessions", path_id(session_id)?, "end"];
        self.send(self.post(&path)?.json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    // --- request plumbing ---

    fn post(&self, segments: &[&str]) -> GuardResult<reqwest::RequestBuilder> {
        Ok(self.with_headers(self.client.post(self.endpoint(segments)?)))
    }

    fn get(&self, segments: &[&str]) -> GuardResult<reqwest::RequestBuilder> {
        Ok(self.with_headers(self.client.get(self.endpoint(segments)?)))
    }

    /// Append path segments to the base address, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> GuardResult<reqwest::Url> {
        let invalid = |reason: String| GuardError::Unreachable {
            base_url: self.base_url.clone(),
            reason,
        };

        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid address: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid("address cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Content-Type", "application/json");
        match &self.auth_token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// Send a request, mapping transport failures and non-2xx statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> GuardResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| GuardError::Unreachable {
            base_url: self.base_url.clone(),
            reason: if e.is_timeout() {
                "request timed out".into()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "Ctrl Dot returned error status");
        Err(error_from_status(status.as_u16(), &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> GuardResult<T> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| GuardError::Protocol {
            status,
            message: format!("Failed to read response body: {e}"),
        })?;
        serde_json::from_str(&body).map_err(|e| GuardError::Protocol {
            status,
            message: format!("Failed to parse response: {e}"),
        })
    }
}

/// Check that a caller-supplied id can stand as one path segment.
///
/// `/`, `?` and `#` are percent-encoded by [`CtrlDotClient::endpoint`]; dot
/// segments and empty ids cannot be encoded away and are rejected.
fn path_id(id: &str) -> GuardResult<&str> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(GuardError::InvalidIdentifier(format!(
            "'{id}' cannot be used as a path segment"
        )));
    }
    Ok(id)
}

#[async_trait]
impl PolicyChannel for CtrlDotClient {
    async fn propose_action(&self, proposal: &Proposal) -> GuardResult<Decision> {
        CtrlDotClient::propose_action(self, proposal).await
    }
}
