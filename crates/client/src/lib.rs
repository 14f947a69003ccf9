//! Decision channel for the Ctrl Dot policy authority.
//!
//! [`CtrlDotClient`] submits proposals over HTTP and maps the outcome onto
//! the guard's decision/error model:
//!
//! | Outcome | Result |
//! |---|---|
//! | 2xx, ALLOW / WARN / THROTTLE | `Ok(Decision)` |
//! | 2xx, DENY / STOP | `Err(GuardError::Denied)` |
//! | connect failure or timeout | `Err(GuardError::Unreachable)` |
//! | 403, or 400 carrying a `decision` | `Err(GuardError::Denied)` |
//! | any other non-2xx | `Err(GuardError::Protocol)` |
//! | empty, `.` or `..` id in a path | `Err(GuardError::InvalidIdentifier)`, nothing sent |

pub mod client;
pub mod wire;

pub use client::{CtrlDotClient, DEFAULT_TIMEOUT};
pub use wire::{error_from_status, Health, Session, NO_BODY};
