//! SCITT policy engine library entry.
//!
//! Evaluates operator-authored admission policies against the protected
//! header of a signed statement. Wires the header marshaler, the scripting
//! and declarative backends, the verdict classifier, deployment config and
//! metrics into one facade ([`PolicyEngine`]). Intended to be consumed by an
//! endpoint layer and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backend;
pub mod classify;
pub mod config;
pub mod engine;
pub mod obs;

pub use backend::{BackendKind, PolicyProgram, ResourceLimits};
pub use engine::{check_policy_declarative, check_policy_scripting, PolicyEngine};
