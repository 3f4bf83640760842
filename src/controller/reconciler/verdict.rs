//! # Verdict
//!
//! Outcome of one reconcile pass, and its translation into a kube-runtime
//! [`Action`].

use super::ReconcilerError;
use kube_runtime::controller::Action;
use std::time::Duration;

/// What the controller should do after a pass
///
/// Exactly one is produced per pass. It is the only channel through which
/// the engine asks for a retry.
#[derive(Debug)]
pub enum Verdict {
    /// Converged; wait for the next change event
    Continue,
    /// Not converged yet; look again after the delay
    RequeueAfter(Duration),
    /// A correction was written; look again straight away
    RequeueImmediate,
    Error(ReconcilerError),
}

impl Verdict {
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Verdict::Continue)
    }

    /// Label for logs and the requeue metric
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Continue => "continue",
            Verdict::RequeueAfter(_) => "awaiting-readiness",
            Verdict::RequeueImmediate => "drift-corrected",
            Verdict::Error(_) => "error",
        }
    }

    /// Map onto the controller's action; errors go to the error policy
    pub fn into_action(self) -> Result<Action, ReconcilerError> {
        match self {
            Verdict::Continue => Ok(Action::await_change()),
            Verdict::RequeueAfter(delay) => Ok(Action::requeue(delay)),
            Verdict::RequeueImmediate => Ok(Action::requeue(Duration::ZERO)),
            Verdict::Error(err) => Err(err),
        }
    }
}

impl From<ReconcilerError> for Verdict {
    fn from(err: ReconcilerError) -> Self {
        Verdict::Error(err)
    }
}
