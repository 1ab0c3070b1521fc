//! Top-level facade crate for the SCITT policy engine.
//!
//! Re-exports core types and the engine library so users can depend on a single crate.

pub mod core {
    pub use scitt_policy_core::*;
}

pub mod engine {
    pub use scitt_policy_engine::*;
}

pub use scitt_policy_engine::{check_policy_declarative, check_policy_scripting, PolicyEngine};
