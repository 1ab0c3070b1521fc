//! Determinism and isolation across concurrent evaluations, plus metrics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;

use scitt_policy_core::{ClaimProfile, FailureKind, PolicyVerdict};
use scitt_policy_engine::{PolicyEngine, PolicyProgram};

mod common;
use common::{ietf_header, init_tracing, x509_header};

const SCRIPT: &str = r#"
export function apply(profile, phdr) {
    if (profile !== "IETF") { return "IETF only"; }
    return phdr.cwt.svn >= 1;
}
"#;

const REGO: &str = r#"
package policy

import rego.v1

default allow := false

allow if {
    input.phdr.cwt.svn >= 1
}
"#;

fn programs() -> Vec<PolicyProgram> {
    vec![
        PolicyProgram::scripting(SCRIPT, "policy"),
        PolicyProgram::declarative(REGO),
    ]
}

#[test]
fn concurrent_independent_engines_agree() {
    init_tracing();
    for program in programs() {
        let expected = PolicyEngine::default().evaluate(&program, ClaimProfile::Ietf, &ietf_header());
        assert_eq!(expected, PolicyVerdict::Accepted);

        let verdicts: Vec<PolicyVerdict> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let program = program.clone();
                    s.spawn(move || {
                        PolicyEngine::default().evaluate(&program, ClaimProfile::Ietf, &ietf_header())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(verdicts.iter().all(|v| v == &expected), "{verdicts:?}");
    }
}

#[test]
fn runaway_policy_does_not_disturb_neighbours() {
    let runaway = PolicyProgram::scripting("export function apply() { while (true) {} }", "runaway");
    let healthy = PolicyProgram::scripting(SCRIPT, "healthy");
    let engine = PolicyEngine::default();

    thread::scope(|s| {
        let slow = s.spawn(|| engine.evaluate(&runaway, ClaimProfile::Ietf, &ietf_header()));
        let fast: Vec<_> = (0..4)
            .map(|_| s.spawn(|| engine.evaluate(&healthy, ClaimProfile::Ietf, &ietf_header())))
            .collect();

        for h in fast {
            assert_eq!(h.join().unwrap(), PolicyVerdict::Accepted);
        }
        assert_eq!(slow.join().unwrap().failure_kind(), Some(FailureKind::Execution));
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn check_async_runs_on_blocking_pool() {
    for program in programs() {
        let engine = PolicyEngine::default().with_program(program);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let engine = engine.clone();
            let (profile, header) = if i % 2 == 0 {
                (ClaimProfile::Ietf, ietf_header())
            } else {
                (ClaimProfile::X509, x509_header())
            };
            tasks.push(tokio::spawn(async move {
                (profile, engine.check_async(profile, header).await)
            }));
        }

        for t in tasks {
            let (profile, res) = t.await.unwrap();
            match profile {
                ClaimProfile::Ietf => assert_eq!(res.unwrap(), None),
                ClaimProfile::X509 => assert!(res.unwrap().is_some()),
            }
        }
    }
}

#[test]
fn metrics_track_outcomes() {
    let engine = PolicyEngine::default();
    let script = PolicyProgram::scripting(SCRIPT, "policy");
    let rego = PolicyProgram::declarative(REGO);
    let broken = PolicyProgram::scripting("export function apply( {", "policy");

    engine.evaluate(&script, ClaimProfile::Ietf, &ietf_header());
    engine.evaluate(&script, ClaimProfile::X509, &ietf_header());
    engine.evaluate(&rego, ClaimProfile::Ietf, &ietf_header());
    engine.evaluate(&broken, ClaimProfile::Ietf, &ietf_header());

    let m = engine.metrics();
    let count = |backend: &str, outcome: &str| {
        m.evaluations.get(&[("backend", backend), ("outcome", outcome)])
    };
    assert_eq!(count("scripting", "accepted"), 1);
    assert_eq!(count("scripting", "rejected"), 1);
    assert_eq!(count("scripting", "failed"), 1);
    assert_eq!(count("declarative", "accepted"), 1);
    assert_eq!(m.failures.get(&[("backend", "scripting"), ("kind", "module")]), 1);

    // The broken module never compiled, so only two compile timings exist.
    assert_eq!(m.compile_duration.count(&[("backend", "scripting")]), 2);
    assert_eq!(m.execution_duration.count(&[("backend", "scripting")]), 2);

    let text = m.render();
    assert!(text.contains("# TYPE scitt_policy_evaluations_total counter"));
    assert!(text.contains("scitt_policy_execution_duration_us_bucket"));
}
