use std::time::Duration;

use serde::Deserialize;
use scitt_policy_core::{PolicyError, Result};

use crate::backend::{
    BackendKind, PolicyProgram, ResourceLimits, DEFAULT_ENTRY_POINT, DEFAULT_POLICY_NAME,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub version: u32,

    #[serde(default)]
    pub policy: PolicySection,

    #[serde(default)]
    pub limits: LimitsSection,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PolicyError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        self.policy.validate()?;
        self.limits.validate()?;

        Ok(())
    }
}

/// Which policy is active. At most one of `policy_script` / `policy_rego`;
/// neither means no policy is enforced.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    #[serde(default)]
    pub policy_script: Option<String>,

    #[serde(default)]
    pub policy_rego: Option<String>,

    #[serde(default = "default_policy_name")]
    pub policy_name: String,

    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            policy_script: None,
            policy_rego: None,
            policy_name: default_policy_name(),
            entry_point: default_entry_point(),
        }
    }
}

impl PolicySection {
    pub fn validate(&self) -> Result<()> {
        if self.policy_script.is_some() && self.policy_rego.is_some() {
            return Err(PolicyError::Config(
                "policy.policy_script and policy.policy_rego are mutually exclusive".into(),
            ));
        }
        if self.policy_name.trim().is_empty() {
            return Err(PolicyError::Config("policy.policy_name must not be empty".into()));
        }
        if !is_identifier(&self.entry_point) {
            return Err(PolicyError::Config(format!(
                "policy.entry_point must be a JS identifier, got {:?}",
                self.entry_point
            )));
        }
        Ok(())
    }

    pub fn backend(&self) -> Option<BackendKind> {
        self.program().map(|p| p.kind())
    }

    /// Program to evaluate, `None` when no policy is configured.
    pub fn program(&self) -> Option<PolicyProgram> {
        if let Some(source) = &self.policy_script {
            return Some(PolicyProgram::Scripting {
                source: source.clone(),
                name: self.policy_name.clone(),
                entry: self.entry_point.clone(),
            });
        }
        self.policy_rego
            .as_ref()
            .map(|source| PolicyProgram::declarative(source.clone()))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_max_heap_bytes")]
    pub max_heap_bytes: usize,

    #[serde(default = "default_max_stack_bytes")]
    pub max_stack_bytes: usize,

    #[serde(default = "default_max_execution_time_ms")]
    pub max_execution_time_ms: u64,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_heap_bytes: default_max_heap_bytes(),
            max_stack_bytes: default_max_stack_bytes(),
            max_execution_time_ms: default_max_execution_time_ms(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if !(1024 * 1024..=256 * 1024 * 1024).contains(&self.max_heap_bytes) {
            return Err(PolicyError::Config(
                "limits.max_heap_bytes must be between 1MiB and 256MiB".into(),
            ));
        }
        if !(64 * 1024..=8 * 1024 * 1024).contains(&self.max_stack_bytes) {
            return Err(PolicyError::Config(
                "limits.max_stack_bytes must be between 64KiB and 8MiB".into(),
            ));
        }
        if !(1..=60_000).contains(&self.max_execution_time_ms) {
            return Err(PolicyError::Config(
                "limits.max_execution_time_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn to_limits(&self) -> ResourceLimits {
        ResourceLimits {
            max_heap_bytes: self.max_heap_bytes,
            max_stack_bytes: self.max_stack_bytes,
            max_execution_time: Duration::from_millis(self.max_execution_time_ms),
        }
    }
}

fn default_policy_name() -> String {
    DEFAULT_POLICY_NAME.into()
}
fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.into()
}
fn default_max_heap_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_max_stack_bytes() -> usize {
    1024 * 1024
}
fn default_max_execution_time_ms() -> u64 {
    1000
}
