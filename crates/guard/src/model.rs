//! Guarded model provider: every completion is proposed to Ctrl Dot first.

use async_trait::async_trait;
use ctrldot_core::error::ProviderError;
use ctrldot_core::provider::*;
use ctrldot_core::{
    build_model_call_proposal, DecisionKind, GuardError, Meta, ModelInput, PolicyChannel,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::throttle::apply_throttle;

/// A provider that asks the policy authority before delegating each call.
///
/// Implements [`Provider`] itself, so it can stand in wherever the wrapped
/// provider was used.
pub struct GuardedProvider {
    inner: Arc<dyn Provider>,
    channel: Arc<dyn PolicyChannel>,
    agent_id: String,
    session_id: String,
    cheap_model: Option<String>,
}

impl GuardedProvider {
    /// Wrap a provider for one agent session.
    pub fn new(
        inner: Arc<dyn Provider>,
        channel: Arc<dyn PolicyChannel>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            channel,
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            cheap_model: None,
        }
    }

    /// Configure a cheap-model alternative, enabling the cheap THROTTLE branch.
    pub fn with_cheap_model(mut self, model: impl Into<String>) -> Self {
        self.cheap_model = Some(model.into()).filter(|m| !m.is_empty());
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cheap_model(&self) -> Option<&str> {
        self.cheap_model.as_deref()
    }

    /// Call `model` with a bare prompt or a message list.
    pub async fn invoke(
        &self,
        model: &str,
        input: impl Into<ModelInput>,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.complete(ProviderRequest::new(model, input)).await
    }

    /// Run the decision gate, returning the request to delegate with.
    async fn authorize(&self, request: ProviderRequest) -> Result<ProviderRequest, GuardError> {
        let mut meta = Meta::new();
        meta.insert("tools_count".into(), request.tools.len().into());

        let proposal = build_model_call_proposal(
            &self.agent_id,
            &self.session_id,
            &request.model,
            &request.messages,
            request.max_tokens.map(u64::from),
            None,
            Some(meta),
        );

        let decision = self.channel.propose_action(&proposal).await?;

        match decision.decision {
            DecisionKind::Allow => Ok(request),
            DecisionKind::Warn => {
                warn!(
                    agent_id = %self.agent_id,
                    model = %request.model,
                    reason = %decision.reason,
                    "Ctrl Dot warning"
                );
                Ok(request)
            }
            DecisionKind::Throttle => {
                warn!(
                    agent_id = %self.agent_id,
                    model = %request.model,
                    reason = %decision.reason,
                    model_policy = ?decision.effective_model_policy(),
                    "Ctrl Dot throttle"
                );
                let throttled = apply_throttle(&request, &decision, self.cheap_model.as_deref());
                debug!(
                    max_tokens = ?throttled.max_tokens,
                    temperature = ?throttled.temperature,
                    "Applied throttle"
                );
                Ok(throttled)
            }
            // A conforming channel never returns these, but they must not run.
            DecisionKind::Deny | DecisionKind::Stop => Err(GuardError::Denied {
                decision: decision.decision,
                reason: decision.reason,
            }),
        }
    }
}

#[async_trait]
impl Provider for GuardedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let request = match self.authorize(request).await {
            Ok(request) => request,
            Err(e) => {
                error!(agent_id = %self.agent_id, action_type = "llm.call", error = %e, "Ctrl Dot blocked model call");
                return Err(e.into());
            }
        };

        self.inner.complete(request).await.inspect_err(|e| {
            error!(
                provider = %self.inner.name(),
                error = %e,
                "Guarded model call failed"
            );
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        self.inner.list_models().await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
