//! Verdict Classifier: maps backend outcomes onto [`PolicyVerdict`].
//!
//! The two backends deliberately differ. Scripting policies follow JS
//! truthiness and may supply their own rejection reason; declarative
//! policies must yield exactly one boolean and are refused with a fixed
//! reason.

use serde_json::Value as Json;

use scitt_policy_core::{PolicyError, PolicyVerdict};

use crate::backend::declarative::QueryOutcome;
use crate::backend::scripting::{ReturnValue, ScriptOutcome};

/// Rejection reason reported for every declarative `allow == false`.
pub const DECLARATIVE_REJECTION: &str = "Input statement rejected";

pub fn classify_script(outcome: ScriptOutcome) -> PolicyVerdict {
    match outcome {
        ScriptOutcome::Returned(ReturnValue::Reason(reason)) => PolicyVerdict::rejected(reason),
        ScriptOutcome::Returned(ReturnValue::Truthy) => PolicyVerdict::Accepted,
        ScriptOutcome::Returned(ReturnValue::Falsy(shown)) => {
            PolicyError::UnexpectedReturn(shown).into()
        }
        ScriptOutcome::Failed(e) => e.into(),
    }
}

pub fn classify_query(outcome: QueryOutcome) -> PolicyVerdict {
    match outcome {
        QueryOutcome::Output(out) => match out.expressions.as_slice() {
            [Json::Bool(true)] => PolicyVerdict::Accepted,
            [Json::Bool(false)] => PolicyVerdict::rejected(DECLARATIVE_REJECTION),
            _ => PolicyError::UnexpectedReturn(out.raw).into(),
        },
        QueryOutcome::Failed(e) => e.into(),
    }
}
