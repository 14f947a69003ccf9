//! Guarded tool: every execution is proposed to Ctrl Dot first.
//!
//! The wrapped tool's calling convention is resolved once, when the guard
//! is built, into an [`InnerTool`]. A full [`Tool`] is preferred, then a
//! [`Runnable`], then a plain closure.

use async_trait::async_trait;
use ctrldot_core::{
    build_tool_call_proposal, DecisionKind, GuardError, Meta, PolicyChannel, Runnable, Tool,
    ToolArgs, ToolError, ToolFn, ToolResult,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Description reported when the wrapped tool has none of its own.
pub const DEFAULT_DESCRIPTION: &str = "Guarded by Ctrl Dot";

/// The calling convention of a wrapped tool.
#[derive(Clone)]
pub enum InnerTool {
    /// A tool with a dedicated `execute` entry point.
    NamedRun(Arc<dyn Tool>),
    /// A tool body with a generic `run` entry point.
    GenericRun(Arc<dyn Runnable>),
    /// A directly invocable closure.
    Callable(ToolFn),
}

impl InnerTool {
    /// Short label sent as `tool_class` in proposal metadata.
    pub fn label(&self) -> &'static str {
        match self {
            InnerTool::NamedRun(_) => "named_run",
            InnerTool::GenericRun(_) => "generic_run",
            InnerTool::Callable(_) => "callable",
        }
    }

    async fn invoke(&self, args: ToolArgs) -> std::result::Result<ToolResult, ToolError> {
        match self {
            InnerTool::NamedRun(tool) => tool.execute(Value::Object(args)).await,
            InnerTool::GenericRun(runnable) => runnable.run(args).await.map(ToolResult::from_value),
            InnerTool::Callable(f) => f(args).map(ToolResult::from_value),
        }
    }
}

impl std::fmt::Debug for InnerTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A tool that asks the policy authority before each execution.
pub struct GuardedTool {
    inner: InnerTool,
    name: String,
    description: String,
    parameters_schema: Value,
    channel: Arc<dyn PolicyChannel>,
    agent_id: String,
    session_id: String,
}

impl GuardedTool {
    /// Guard a tool of any calling convention under an explicit name.
    pub fn new(
        inner: InnerTool,
        name: impl Into<String>,
        channel: Arc<dyn PolicyChannel>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            name: name.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            parameters_schema: serde_json::json!({"type": "object"}),
            channel,
            agent_id: agent_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Guard a full tool, taking over its name, description and schema.
    pub fn wrap(
        tool: Arc<dyn Tool>,
        channel: Arc<dyn PolicyChannel>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        let schema = tool.parameters_schema();

        let guarded = Self::new(InnerTool::NamedRun(tool), name, channel, agent_id, session_id)
            .with_parameters_schema(schema);
        if description.is_empty() {
            guarded
        } else {
            guarded.with_description(description)
        }
    }

    /// Guard a tool body that only exposes `run`.
    pub fn wrap_runnable(
        name: impl Into<String>,
        runnable: Arc<dyn Runnable>,
        channel: Arc<dyn PolicyChannel>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self::new(InnerTool::GenericRun(runnable), name, channel, agent_id, session_id)
    }

    /// Guard a plain closure.
    pub fn wrap_fn(
        name: impl Into<String>,
        f: ToolFn,
        channel: Arc<dyn PolicyChannel>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self::new(InnerTool::Callable(f), name, channel, agent_id, session_id)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declared argument schema, reported to the model unchanged.
    pub fn with_parameters_schema(mut self, schema: Value) -> Self {
        self.parameters_schema = schema;
        self
    }

    pub fn inner(&self) -> &InnerTool {
        &self.inner
    }

    /// Propose, then run the wrapped tool with `args`.
    pub async fn run(&self, args: ToolArgs) -> std::result::Result<ToolResult, ToolError> {
        if let Err(e) = self.authorize(&args).await {
            error!(tool = %self.name, agent_id = %self.agent_id, error = %e, "Ctrl Dot blocked tool call");
            return Err(e.into());
        }

        self.inner.invoke(args).await.inspect_err(|e| {
            error!(tool = %self.name, error = %e, "Guarded tool failed");
        })
    }

    async fn authorize(&self, args: &ToolArgs) -> Result<(), GuardError> {
        let mut meta = Meta::new();
        meta.insert("tool_class".into(), self.inner.label().into());

        let proposal = build_tool_call_proposal(
            &self.agent_id,
            &self.session_id,
            &self.name,
            args,
            Some(0),
            Some(0.0),
            Some(meta),
        );

        let decision = self.channel.propose_action(&proposal).await?;

        match decision.decision {
            DecisionKind::Allow => Ok(()),
            DecisionKind::Warn => {
                warn!(tool = %self.name, reason = %decision.reason, "Ctrl Dot warning");
                Ok(())
            }
            // Tool arguments have no cheaper variant; the call proceeds as proposed.
            DecisionKind::Throttle => {
                warn!(tool = %self.name, reason = %decision.reason, "Ctrl Dot throttle");
                Ok(())
            }
            DecisionKind::Deny | DecisionKind::Stop => Err(GuardError::Denied {
                decision: decision.decision,
                reason: decision.reason,
            }),
        }
    }
}

impl std::fmt::Debug for GuardedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedTool")
            .field("name", &self.name)
            .field("inner", &self.inner)
            .field("agent_id", &self.agent_id)
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[async_trait]
impl Tool for GuardedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError> {
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => ToolArgs::new(),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "{} expects an object of keyword arguments, got {other}",
                    self.name
                )));
            }
        };
        self.run(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrldot_core::{Decision, GuardResult, Proposal};
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedChannel {
        outcome: GuardResult<Decision>,
        proposals: Mutex<Vec<Proposal>>,
    }

    impl ScriptedChannel {
        fn new(outcome: GuardResult<Decision>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                proposals: Mutex::new(Vec::new()),
            })
        }

        fn allow() -> Arc<Self> {
            Self::new(Ok(Decision::allow()))
        }

        fn proposals(&self) -> Vec<Proposal> {
            self.proposals.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PolicyChannel for ScriptedChannel {
        async fn propose_action(&self, proposal: &Proposal) -> GuardResult<Decision> {
            self.proposals.lock().unwrap().push(proposal.clone());
            self.outcome.clone()
        }
    }

    /// A full tool that records the arguments it was executed with.
    struct WriteFileTool {
        calls: Mutex<Vec<Value>>,
    }

    impl WriteFileTool {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Value> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Tool for WriteFileTool {
        fn name(&self) -> &str {
            "filesystem.write"
        }
        fn description(&self) -> &str {
            "Write a file"
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            })
        }
        async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError> {
            self.calls.lock().unwrap().push(arguments.clone());
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: format!("wrote {}", arguments["path"].as_str().unwrap_or("")),
                data: None,
            })
        }
    }

    /// A tool body exposing only `run`.
    struct AddRunnable {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Runnable for AddRunnable {
        async fn run(&self, args: ToolArgs) -> std::result::Result<Value, ToolError> {
            *self.calls.lock().unwrap() += 1;
            let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
            let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(a + b))
        }
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    fn deny(reason: &str) -> GuardResult<Decision> {
        Err(GuardError::Denied {
            decision: DecisionKind::Deny,
            reason: reason.into(),
        })
    }

    #[tokio::test]
    async fn allow_executes_named_tool() {
        let tool = WriteFileTool::new();
        let guard = GuardedTool::wrap(tool.clone(), ScriptedChannel::allow(), "agent-1", "sess-1");

        let result = guard.execute(json!({"path": "/tmp/a.md"})).await.unwrap();
        assert_eq!(result.output, "wrote /tmp/a.md");
        assert_eq!(tool.calls(), vec![json!({"path": "/tmp/a.md"})]);
    }

    #[tokio::test]
    async fn proposal_carries_arguments_and_zero_estimates() {
        let channel = ScriptedChannel::allow();
        let guard = GuardedTool::wrap(WriteFileTool::new(), channel.clone(), "agent-1", "sess-1");

        guard.run(args(json!({"path": "/tmp/a.md"}))).await.unwrap();

        let proposals = channel.proposals();
        assert_eq!(proposals.len(), 1);
        let p = &proposals[0];
        assert_eq!(p.action.action_type, "tool.call.filesystem.write");
        assert_eq!(p.action.target["path"], "/tmp/a.md");
        assert_eq!(p.cost.estimated_tokens, 0);
        assert_eq!(p.cost.estimated_gbp, 0.0);
        assert_eq!(p.context.meta["tool_class"], "named_run");
    }

    #[tokio::test]
    async fn denial_propagates_without_executing() {
        let tool = WriteFileTool::new();
        let guard = GuardedTool::wrap(
            tool.clone(),
            ScriptedChannel::new(deny("Requires resolution")),
            "agent-1",
            "sess-1",
        );

        let err = guard.execute(json!({"path": "/etc/passwd"})).await.unwrap_err();
        match err {
            ToolError::Guard(g) => assert_eq!(g.denial_reason(), Some("Requires resolution")),
            other => panic!("Expected Guard denial, got: {other:?}"),
        }
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn stop_decision_from_nonconforming_channel_still_blocks() {
        let tool = WriteFileTool::new();
        let channel = ScriptedChannel::new(Ok(Decision::new(DecisionKind::Stop, "Panic")));
        let guard = GuardedTool::wrap(tool.clone(), channel, "agent-1", "sess-1");

        assert!(guard.execute(json!({})).await.is_err());
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn throttle_runs_with_original_arguments() {
        let tool = WriteFileTool::new();
        let channel = ScriptedChannel::new(Ok(Decision::new(DecisionKind::Throttle, "Slow down")));
        let guard = GuardedTool::wrap(tool.clone(), channel, "agent-1", "sess-1");

        guard.execute(json!({"path": "/tmp/b.md"})).await.unwrap();
        assert_eq!(tool.calls(), vec![json!({"path": "/tmp/b.md"})]);
    }

    #[tokio::test]
    async fn warn_proceeds() {
        let tool = WriteFileTool::new();
        let channel = ScriptedChannel::new(Ok(Decision::new(DecisionKind::Warn, "Near limit")));
        let guard = GuardedTool::wrap(tool.clone(), channel, "agent-1", "sess-1");

        assert!(guard.execute(json!({"path": "x"})).await.is_ok());
        assert_eq!(tool.calls().len(), 1);
    }

    #[tokio::test]
    async fn runnable_result_is_string_coerced() {
        let runnable = Arc::new(AddRunnable { calls: Mutex::new(0) });
        let channel = ScriptedChannel::allow();
        let guard = GuardedTool::wrap_runnable("math.add", runnable.clone(), channel.clone(), "a", "s");

        let result = guard.execute(json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(result.output, "5");
        assert_eq!(*runnable.calls.lock().unwrap(), 1);
        assert_eq!(channel.proposals()[0].context.meta["tool_class"], "generic_run");
    }

    #[tokio::test]
    async fn callable_only_tool_is_invoked_directly() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let f: ToolFn = Arc::new(move |args: ToolArgs| {
            *counter.lock().unwrap() += 1;
            let q = args.get("q").and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("results for {q}")))
        });
        let channel = ScriptedChannel::allow();
        let guard = GuardedTool::wrap_fn("web.search", f, channel.clone(), "a", "s");

        let result = guard.execute(json!({"q": "rust"})).await.unwrap();
        assert_eq!(result.output, "results for rust");
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(channel.proposals()[0].context.tool, "web.search");
    }

    #[tokio::test]
    async fn delegate_failure_passes_through_unchanged() {
        let f: ToolFn = Arc::new(|_: ToolArgs| {
            Err(ToolError::ExecutionFailed {
                tool_name: "git.push".into(),
                reason: "rejected".into(),
            })
        });
        let guard = GuardedTool::wrap_fn("git.push", f, ScriptedChannel::allow(), "a", "s");

        match guard.execute(json!({})).await.unwrap_err() {
            ToolError::ExecutionFailed { reason, .. } => assert_eq!(reason, "rejected"),
            other => panic!("Expected ExecutionFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected_before_proposing() {
        let channel = ScriptedChannel::allow();
        let guard = GuardedTool::wrap(WriteFileTool::new(), channel.clone(), "a", "s");

        let err = guard.execute(json!(["not", "kwargs"])).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(channel.proposals().is_empty());
    }

    #[tokio::test]
    async fn null_arguments_mean_no_arguments() {
        let channel = ScriptedChannel::allow();
        let guard = GuardedTool::wrap(WriteFileTool::new(), channel.clone(), "a", "s");

        guard.execute(Value::Null).await.unwrap();
        assert!(channel.proposals()[0].action.target.is_empty());
    }

    #[test]
    fn surface_mirrors_wrapped_tool() {
        let guard = GuardedTool::wrap(WriteFileTool::new(), ScriptedChannel::allow(), "a", "s");
        assert_eq!(guard.name(), "filesystem.write");
        assert_eq!(guard.description(), "Write a file");
        assert_eq!(guard.parameters_schema()["required"][0], "path");
        assert_eq!(guard.to_definition().name, "filesystem.write");
        assert_eq!(guard.inner().label(), "named_run");
    }

    #[test]
    fn bare_tools_get_default_surface() {
        let f: ToolFn = Arc::new(|_: ToolArgs| Ok(Value::Null));
        let guard = GuardedTool::wrap_fn("noop", f, ScriptedChannel::allow(), "a", "s");
        assert_eq!(guard.description(), DEFAULT_DESCRIPTION);
        assert_eq!(guard.parameters_schema(), json!({"type": "object"}));

        let described = guard.with_description("Does nothing");
        assert_eq!(described.description(), "Does nothing");
    }
}
