//! Policy engine facade.
//!
//! Holds read-only deployment state (limits, configured program, metrics)
//! and wires marshaling, backend and classifier together. Cloning is cheap
//! and every evaluation builds its own interpreter, so one engine can be
//! shared across threads.

use std::sync::Arc;

use scitt_policy_core::{
    marshal, ClaimProfile, PolicyError, PolicyVerdict, ProtectedHeader, RejectReason, Result,
    Target,
};

use crate::backend::{
    declarative, scripting, PolicyProgram, ResourceLimits, DEFAULT_ENTRY_POINT,
};
use crate::classify::{classify_query, classify_script};
use crate::config::EngineConfig;
use crate::obs::EngineMetrics;

#[derive(Clone, Default)]
pub struct PolicyEngine {
    limits: ResourceLimits,
    program: Option<Arc<PolicyProgram>>,
    metrics: Arc<EngineMetrics>,
}

impl PolicyEngine {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            program: None,
            metrics: Arc::new(EngineMetrics::default()),
        }
    }

    /// Build from a validated config. The backend kind is fixed here.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        let engine = Self::new(cfg.limits.to_limits());
        match cfg.policy.program() {
            Some(program) => engine.with_program(program),
            None => engine,
        }
    }

    pub fn with_program(mut self, program: PolicyProgram) -> Self {
        tracing::info!(backend = program.kind().as_str(), "policy configured");
        self.program = Some(Arc::new(program));
        self
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn program(&self) -> Option<&PolicyProgram> {
        self.program.as_deref()
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run `program` against one statement and return the ternary verdict.
    pub fn evaluate(
        &self,
        program: &PolicyProgram,
        profile: ClaimProfile,
        header: &ProtectedHeader,
    ) -> PolicyVerdict {
        let backend = program.kind();
        let (verdict, timings) = match program {
            PolicyProgram::Scripting {
                source,
                name,
                entry,
            } => {
                let input = marshal(profile, header, Target::Scripting);
                let eval = scripting::evaluate_script(source, name, entry, &input, &self.limits);
                (classify_script(eval.outcome), eval.timings)
            }
            PolicyProgram::Declarative { source } => {
                let input = marshal(profile, header, Target::Declarative);
                let eval = declarative::evaluate_query(source, &input);
                (classify_query(eval.outcome), eval.timings)
            }
        };

        if let PolicyVerdict::EvaluationFailed(e) = &verdict {
            tracing::warn!(
                backend = backend.as_str(),
                kind = e.kind().map(|k| k.as_str()).unwrap_or("unknown"),
                error = %e,
                "policy evaluation failed"
            );
        }
        self.metrics.record(backend, &verdict, &timings);
        verdict
    }

    /// Evaluate a scripting policy whose `apply` export lives in module
    /// `policy_name`.
    pub fn check_policy_scripting(
        &self,
        source: &str,
        policy_name: &str,
        profile: ClaimProfile,
        header: &ProtectedHeader,
    ) -> Result<Option<RejectReason>> {
        let program = PolicyProgram::Scripting {
            source: source.to_string(),
            name: policy_name.to_string(),
            entry: DEFAULT_ENTRY_POINT.to_string(),
        };
        self.evaluate(&program, profile, header).into_result()
    }

    pub fn check_policy_declarative(
        &self,
        source: &str,
        profile: ClaimProfile,
        header: &ProtectedHeader,
    ) -> Result<Option<RejectReason>> {
        let program = PolicyProgram::declarative(source);
        self.evaluate(&program, profile, header).into_result()
    }

    /// Evaluate the configured program. With no policy configured every
    /// statement is admitted.
    pub fn check(
        &self,
        profile: ClaimProfile,
        header: &ProtectedHeader,
    ) -> Result<Option<RejectReason>> {
        match &self.program {
            Some(program) => self.evaluate(program, profile, header).into_result(),
            None => Ok(None),
        }
    }

    /// [`check`](Self::check) on the blocking pool, for async handlers.
    pub async fn check_async(
        &self,
        profile: ClaimProfile,
        header: ProtectedHeader,
    ) -> Result<Option<RejectReason>> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.check(profile, &header))
            .await
            .map_err(|e| PolicyError::Execution {
                message: format!("policy evaluation task failed: {e}"),
                trace: None,
            })?
    }
}

/// [`PolicyEngine::check_policy_scripting`] with default limits.
pub fn check_policy_scripting(
    source: &str,
    policy_name: &str,
    profile: ClaimProfile,
    header: &ProtectedHeader,
) -> Result<Option<RejectReason>> {
    PolicyEngine::default().check_policy_scripting(source, policy_name, profile, header)
}

/// [`PolicyEngine::check_policy_declarative`] with default limits.
pub fn check_policy_declarative(
    source: &str,
    profile: ClaimProfile,
    header: &ProtectedHeader,
) -> Result<Option<RejectReason>> {
    PolicyEngine::default().check_policy_declarative(source, profile, header)
}
