//! Declarative-query backend (Rego via regorus).
//!
//! Per call a fresh `Engine` in Rego v1 mode loads the policy under the fixed
//! module name, receives the query input document, and is queried once at
//! `data.policy.allow`. The interpreter has no I/O builtins, so the policy
//! can only see its input.
//!
//! Input document (policies are written against this shape):
//!
//! ```json
//! { "profile": "IETF" | "X509",
//!   "phdr": { "alg"?: int, "cty"?: int | string,
//!             "cwt": { "iss"?: string, "sub"?: string, "iat"?: int, "svn"?: int } } }
//! ```

use std::time::{Duration, Instant};

use regorus::{Engine, Value as RegoValue};
use serde_json::Value as Json;

use scitt_policy_core::{NativeInput, PolicyError, Result};

use super::{Evaluation, Timings};

/// Module name the policy source is loaded under.
pub const POLICY_MODULE: &str = "policy";
/// Fixed rule address every declarative policy must define.
pub const ALLOW_QUERY: &str = "data.policy.allow";

/// Expression values produced by the query, plus the serialized output
/// kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub expressions: Vec<Json>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Output(QueryOutput),
    Failed(PolicyError),
}

/// Load `source`, bind `data.policy.allow`, and evaluate it once against
/// the marshaled input.
pub fn evaluate_query(source: &str, input: &NativeInput) -> Evaluation<QueryOutcome> {
    let mut timings = Timings::default();
    let outcome = match run(source, input, &mut timings) {
        Ok(out) => QueryOutcome::Output(out),
        Err(e) => QueryOutcome::Failed(e),
    };
    Evaluation { outcome, timings }
}

fn run(source: &str, input: &NativeInput, timings: &mut Timings) -> Result<QueryOutput> {
    let started = Instant::now();

    let mut engine = Engine::new();
    engine.set_rego_v1(true);
    engine
        .add_policy(format!("{POLICY_MODULE}.rego"), source.to_string())
        .map_err(|e| PolicyError::Module(e.to_string()))?;

    let compiled = started.elapsed();
    timings.compile = Some(compiled);
    tracing::info!(elapsed_us = micros(compiled), "Rego policy compilation took");

    let started = Instant::now();

    let document = input.to_query_input().to_string();
    let term = RegoValue::from_json_str(&document).map_err(|e| PolicyError::Input(e.to_string()))?;
    engine.set_input(term);

    // The query is a fixed rule path, so an error here comes from evaluating
    // the policy (conflicting outputs, strict builtin failures).
    let results = engine
        .eval_query(ALLOW_QUERY.to_string(), false)
        .map_err(|e| PolicyError::Execution {
            message: e.to_string(),
            trace: None,
        })?;

    let elapsed = started.elapsed();
    timings.execution = Some(elapsed);
    tracing::info!(elapsed_us = micros(elapsed), "Rego policy evaluation took");

    let raw = serde_json::to_string(&results)
        .map_err(|e| PolicyError::UnexpectedReturn(format!("unreadable query output: {e}")))?;
    let expressions = results
        .result
        .iter()
        .flat_map(|r| r.expressions.iter())
        .map(|e| serde_json::to_value(&e.value))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PolicyError::UnexpectedReturn(format!("unreadable query output: {e}")))?;

    Ok(QueryOutput { expressions, raw })
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
