//! Shared fixtures for engine tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use bytes::Bytes;

use scitt_policy_core::{ContentType, CwtClaims, FailureKind, PolicyError, ProtectedHeader};

pub const ISSUER: &str =
    "did:x509:0:sha256:HnwZ4lezuxq_GVcl_Sk7YWW170qAD0DZBLXilXet0jg::eku:1.3.6.1.4.1.311.10.3.13";

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn ietf_header() -> ProtectedHeader {
    ProtectedHeader {
        alg: Some(-7),
        cty: Some(ContentType::Text("application/json".into())),
        cwt_claims: CwtClaims {
            iss: Some(ISSUER.into()),
            sub: Some("demo".into()),
            iat: Some(1_700_000_000),
            svn: Some(1),
        },
        ..Default::default()
    }
}

pub fn x509_header() -> ProtectedHeader {
    ProtectedHeader {
        alg: Some(-35),
        kid: Some("abc".into()),
        cty: Some(ContentType::Int(50)),
        x5chain: Some(vec![Bytes::from_static(&[0x30, 0x03, 0x02, 0x01, 0x01])]),
        ..Default::default()
    }
}

pub fn assert_kind(err: &PolicyError, kind: FailureKind) {
    assert_eq!(err.kind(), Some(kind), "unexpected error: {err}");
    assert_eq!(err.code().as_str(), "PolicyError");
}
