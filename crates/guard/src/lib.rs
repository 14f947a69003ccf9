//! # Ctrl Dot Guard
//!
//! Drop-in wrappers that put the Ctrl Dot policy authority in front of an
//! agent's model and tool calls.
//!
//! | Decision   | Model call                         | Tool call            |
//! |------------|------------------------------------|----------------------|
//! | `ALLOW`    | delegate                           | delegate             |
//! | `WARN`     | log, delegate                      | log, delegate        |
//! | `THROTTLE` | log, [`apply_throttle`], delegate  | log, delegate        |
//! | `DENY`     | `GuardError::Denied`, no delegate  | same                 |
//! | `STOP`     | `GuardError::Denied`, no delegate  | same                 |
//!
//! ```rust,ignore
//! let channel = Arc::new(CtrlDotClient::from_env(None, None)?);
//! let llm = GuardedProvider::new(openai, channel.clone(), "crew-1", "run-42")
//!     .with_cheap_model("gpt-4o-mini");
//! let shell = GuardedTool::wrap(shell_tool, channel, "crew-1", "run-42");
//! ```

pub mod model;
pub mod throttle;
pub mod tool;

pub use model::GuardedProvider;
pub use throttle::apply_throttle;
pub use tool::{GuardedTool, InnerTool, DEFAULT_DESCRIPTION};
