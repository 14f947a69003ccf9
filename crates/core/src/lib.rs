//! # Ctrl Dot Core
//!
//! Domain types, traits, and error definitions for the Ctrl Dot agent guard.
//! This crate does no I/O. It defines the proposal/decision model and the
//! capability traits that the client and guard crates implement against.
//!
//! ```text
//! caller ─▶ guarded wrapper ─▶ proposal ─▶ PolicyChannel ─▶ decision
//!                 │                                            │
//!                 └──────────── delegate (Provider / Tool) ◀───┘
//! ```

pub mod decision;
pub mod error;
pub mod message;
pub mod policy;
pub mod proposal;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use decision::{
    Decision, DecisionKind, ModelPolicy, Reason, Recommendation, ThrottleInfo, Warning,
};
pub use error::{GuardError, GuardResult, ProviderError, ToolError};
pub use message::{Message, MessageToolCall, ModelInput, Role};
pub use policy::PolicyChannel;
pub use proposal::{
    build_model_call_proposal, build_tool_call_proposal, estimate_tokens, Meta, Proposal,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Runnable, Tool, ToolArgs, ToolFn, ToolResult};
