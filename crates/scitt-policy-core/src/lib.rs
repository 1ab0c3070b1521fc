//! SCITT policy core: statement metadata types, input marshaling, verdicts
//! and the error taxonomy.
//!
//! This crate defines the contracts shared by the policy backends and by the
//! endpoint layer that consumes verdicts. It intentionally carries no
//! interpreter or runtime dependencies so it can be reused by tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `PolicyError`/`Result`; policy source and
//! statement headers are untrusted input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod header;
pub mod marshal;
pub mod verdict;

/// Shared result type.
pub use error::{ErrorCode, FailureKind, PolicyError, Result};
pub use header::{ClaimProfile, ContentType, CwtClaims, Label, ProtectedHeader};
pub use marshal::{marshal, NativeInput, Target};
pub use verdict::{PolicyVerdict, RejectReason};
