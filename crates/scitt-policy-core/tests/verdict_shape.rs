//! Verdict and error surface tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use scitt_policy_core::verdict::{rejection_message, REJECTION_CODE};
use scitt_policy_core::{FailureKind, PolicyError, PolicyVerdict};

#[test]
fn verdict_into_result() {
    assert_eq!(PolicyVerdict::Accepted.into_result().unwrap(), None);
    assert_eq!(
        PolicyVerdict::rejected("nope").into_result().unwrap(),
        Some("nope".to_string())
    );

    let err = PolicyVerdict::failed(FailureKind::Module, "SyntaxError")
        .into_result()
        .expect_err("must fail");
    assert_eq!(err.kind(), Some(FailureKind::Module));
    assert_eq!(err.code().as_str(), "PolicyError");
    assert_eq!(err.detail(), "Invalid policy module: SyntaxError");
}

#[test]
fn every_failure_kind_shares_one_code() {
    let kinds = [
        FailureKind::Module,
        FailureKind::Query,
        FailureKind::Input,
        FailureKind::Execution,
        FailureKind::UnexpectedReturn,
    ];
    for kind in kinds {
        let e = PolicyError::new(kind, "detail");
        assert_eq!(e.kind(), Some(kind));
        assert_eq!(e.code().as_str(), "PolicyError");
        assert!(e.detail().contains("detail"), "kind={}", kind.as_str());
    }
}

#[test]
fn execution_error_keeps_trace() {
    let e = PolicyError::Execution {
        message: "Error: Boom".into(),
        trace: Some("    at apply (policy:1)".into()),
    };
    assert_eq!(
        e.detail(),
        "Error while applying policy: Error: Boom\n    at apply (policy:1)"
    );

    let e = PolicyError::new(FailureKind::Execution, "interrupted");
    assert_eq!(e.detail(), "Error while applying policy: interrupted\n<no trace>");
}

#[test]
fn rejection_is_not_a_failure() {
    let v = PolicyVerdict::rejected("Invalid issuer");
    assert_eq!(v.failure_kind(), None);
    assert_eq!(v.outcome(), "rejected");
    assert_eq!(REJECTION_CODE.as_str(), "PolicyFailed");
    assert_eq!(rejection_message("Invalid issuer"), "Policy was not met: Invalid issuer");
}
