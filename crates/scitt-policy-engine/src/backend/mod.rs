//! Policy backends.
//!
//! Two evaluation strategies sit behind one contract:
//! - Scripting: an ES module exporting an entry-point function (QuickJS).
//! - Declarative: a Rego module queried at `data.policy.allow` (regorus).
//!
//! Every call builds a fresh interpreter. Nothing survives between calls,
//! so a runaway or hostile policy cannot influence a later evaluation.

pub mod declarative;
pub mod scripting;

use std::time::Duration;

pub use scitt_policy_core::Target as BackendKind;

/// Default scripting module name.
pub const DEFAULT_POLICY_NAME: &str = "policy";
/// Default exported entry point of a scripting policy.
pub const DEFAULT_ENTRY_POINT: &str = "apply";

/// Hard ceilings for one scripting invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_heap_bytes: usize,
    pub max_stack_bytes: usize,
    pub max_execution_time: Duration,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_heap_bytes: 10 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
            max_execution_time: Duration::from_millis(1000),
        }
    }
}

/// Phase durations of one evaluation. A phase that never started is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub compile: Option<Duration>,
    pub execution: Option<Duration>,
}

/// Backend result paired with its timings.
#[derive(Debug)]
pub struct Evaluation<O> {
    pub outcome: O,
    pub timings: Timings,
}

/// Policy program selected by deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyProgram {
    Scripting {
        source: String,
        /// Module name; shows up in stack traces.
        name: String,
        /// Exported function invoked as `entry(profile, phdr)`.
        entry: String,
    },
    Declarative {
        source: String,
    },
}

impl PolicyProgram {
    pub fn scripting(source: impl Into<String>, name: impl Into<String>) -> Self {
        PolicyProgram::Scripting {
            source: source.into(),
            name: name.into(),
            entry: DEFAULT_ENTRY_POINT.to_string(),
        }
    }

    pub fn declarative(source: impl Into<String>) -> Self {
        PolicyProgram::Declarative {
            source: source.into(),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            PolicyProgram::Scripting { .. } => BackendKind::Scripting,
            PolicyProgram::Declarative { .. } => BackendKind::Declarative,
        }
    }
}
