//! Policy verdicts.
//!
//! A verdict is ternary: accepted, rejected with a reason, or the policy
//! could not be evaluated. A rejection is a successful evaluation and stays
//! distinguishable from a failure at every layer.

use crate::error::{ErrorCode, FailureKind, PolicyError};

/// Human-readable reason a policy refused a statement.
pub type RejectReason = String;

/// Code reported when a statement is refused by policy.
pub const REJECTION_CODE: ErrorCode = ErrorCode::PolicyFailed;

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    Accepted,
    Rejected { reason: RejectReason },
    /// Carries the failure kind and the backend's message.
    EvaluationFailed(PolicyError),
}

impl PolicyVerdict {
    pub fn rejected(reason: impl Into<RejectReason>) -> Self {
        PolicyVerdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        PolicyVerdict::EvaluationFailed(PolicyError::new(kind, detail))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyVerdict::Accepted)
    }

    /// Failure kind, if the policy could not be evaluated.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PolicyVerdict::EvaluationFailed(e) => e.kind(),
            _ => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            PolicyVerdict::Accepted => "accepted",
            PolicyVerdict::Rejected { .. } => "rejected",
            PolicyVerdict::EvaluationFailed(_) => "failed",
        }
    }

    /// Caller-facing shape: `Ok(None)` accepted, `Ok(Some(reason))` rejected,
    /// `Err` when the policy could not be evaluated.
    pub fn into_result(self) -> Result<Option<RejectReason>, PolicyError> {
        match self {
            PolicyVerdict::Accepted => Ok(None),
            PolicyVerdict::Rejected { reason } => Ok(Some(reason)),
            PolicyVerdict::EvaluationFailed(e) => Err(e),
        }
    }
}

impl From<PolicyError> for PolicyVerdict {
    fn from(err: PolicyError) -> Self {
        PolicyVerdict::EvaluationFailed(err)
    }
}

/// Client-facing message for a refused statement.
pub fn rejection_message(reason: &str) -> String {
    format!("Policy was not met: {reason}")
}
