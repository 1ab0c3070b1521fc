//! Shared error type across the policy crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The policy could not be evaluated.
    PolicyError,
    /// The policy was evaluated and refused the statement.
    PolicyFailed,
    /// Invalid deployment input (configuration).
    InvalidInput,
}

impl ErrorCode {
    /// String representation used in error responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PolicyError => "PolicyError",
            ErrorCode::PolicyFailed => "PolicyFailed",
            ErrorCode::InvalidInput => "InvalidInput",
        }
    }
}

/// Failure category of an evaluation that produced no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Policy source does not parse, or its entry point/module is absent.
    Module,
    /// Query path could not be bound (declarative backend only).
    Query,
    /// Marshaled input rejected by the backend.
    Input,
    /// Runtime exception, or a resource ceiling was exceeded.
    Execution,
    /// Policy returned a value outside the accepted shape.
    UnexpectedReturn,
}

impl FailureKind {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Module => "module",
            FailureKind::Query => "query",
            FailureKind::Input => "input",
            FailureKind::Execution => "execution",
            FailureKind::UnexpectedReturn => "unexpected_return",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Unified error type used by core and engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid policy module: {0}")]
    Module(String),
    #[error("Invalid policy query: {0}")]
    Query(String),
    #[error("Invalid policy input: {0}")]
    Input(String),
    #[error("Error while applying policy: {message}\n{}", .trace.as_deref().unwrap_or("<no trace>"))]
    Execution {
        message: String,
        trace: Option<String>,
    },
    #[error("Unexpected return value from policy: {0}")]
    UnexpectedReturn(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PolicyError {
    /// Build a failure of the given kind. `Execution` failures built this way
    /// carry no trace.
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match kind {
            FailureKind::Module => PolicyError::Module(detail),
            FailureKind::Query => PolicyError::Query(detail),
            FailureKind::Input => PolicyError::Input(detail),
            FailureKind::Execution => PolicyError::Execution {
                message: detail,
                trace: None,
            },
            FailureKind::UnexpectedReturn => PolicyError::UnexpectedReturn(detail),
        }
    }

    /// Map internal error to a stable client-facing code.
    ///
    /// Every evaluation failure shares one code; callers never need the
    /// sub-kind to pick a response.
    pub fn code(&self) -> ErrorCode {
        match self {
            PolicyError::Config(_) => ErrorCode::InvalidInput,
            _ => ErrorCode::PolicyError,
        }
    }

    /// Failure category, `None` for configuration errors.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            PolicyError::Module(_) => Some(FailureKind::Module),
            PolicyError::Query(_) => Some(FailureKind::Query),
            PolicyError::Input(_) => Some(FailureKind::Input),
            PolicyError::Execution { .. } => Some(FailureKind::Execution),
            PolicyError::UnexpectedReturn(_) => Some(FailureKind::UnexpectedReturn),
            PolicyError::Config(_) => None,
        }
    }

    /// Human-readable detail, including the backend's own message.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}
