//! PolicyChannel trait: the seam between guarded wrappers and the
//! policy authority.
//!
//! The HTTP client implements this; tests script it.

use async_trait::async_trait;

use crate::decision::Decision;
use crate::error::GuardResult;
use crate::proposal::Proposal;

/// Submits proposals and returns the authority's decision.
///
/// Implementations must never hand back a DENY or STOP decision: those
/// are surfaced as [`GuardError::Denied`](crate::error::GuardError::Denied)
/// so that a caller cannot accidentally proceed past a denial.
#[async_trait]
pub trait PolicyChannel: Send + Sync {
    async fn propose_action(&self, proposal: &Proposal) -> GuardResult<Decision>;
}
