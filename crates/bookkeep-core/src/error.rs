//! Error types for bookkeep-core
//!
//! `CoreError` covers session, transport and backend failures. `LedgerError`
//! wraps it for the aggregation pipeline so a missing project can be told
//! apart from a failed fetch.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for bookkeep operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Session Errors
    // ===================
    /// No usable session; the caller should send the user to login
    #[error("Not authenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Malformed access token: {reason}")]
    TokenDecode { reason: String },

    #[error("Token refresh rejected: {reason}")]
    RefreshRejected { reason: String },

    // ===================
    // Backend Errors
    // ===================
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// 2xx response whose payload reports an error (`{"error": ...}`)
    #[error("Backend reported an error: {message}")]
    Backend { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Operation timed out after {timeout_secs}s: {operation}")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("Failed to decode {context} response")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Session File Errors
    // ===================
    #[error("Failed to read session file: {path}")]
    SessionFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session file: {path}")]
    SessionFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt session file {path}: {message}")]
    SessionFileParse { path: PathBuf, message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        CoreError::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// True for errors that must end in a login prompt
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CoreError::Unauthenticated { .. })
    }

    /// True for failed calls shown to the user as-is: error statuses,
    /// transport failures, timeouts and unreadable responses
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            CoreError::RequestFailed { .. }
                | CoreError::Backend { .. }
                | CoreError::Transport { .. }
                | CoreError::Timeout { .. }
                | CoreError::Decode { .. }
        )
    }

    /// HTTP status carried by a backend failure
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Why a ledger could not be built
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Project {code} not found")]
    ProjectNotFound { code: i64 },

    #[error("No job categories defined")]
    NoCategories,

    #[error("Ledger fetch failed at {step}")]
    Upstream {
        step: LedgerStep,
        #[source]
        source: CoreError,
    },
}

impl LedgerError {
    /// True when nothing went wrong on the wire, there was just nothing to show
    pub fn is_empty_data(&self) -> bool {
        matches!(
            self,
            LedgerError::ProjectNotFound { .. } | LedgerError::NoCategories
        )
    }
}

/// Pipeline step of the ledger aggregation, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStep {
    Project,
    Categories,
    Jobs,
    Invoices,
}

impl std::fmt::Display for LedgerStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LedgerStep::Project => "project",
            LedgerStep::Categories => "categories",
            LedgerStep::Jobs => "jobs",
            LedgerStep::Invoices => "invoices",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(CoreError::unauthenticated("no session").is_auth_failure());
        assert!(!CoreError::RequestFailed {
            status: 401,
            body: String::new()
        }
        .is_auth_failure());
        assert!(!CoreError::Timeout {
            operation: "GET /high/categ/".to_string(),
            timeout_secs: 30
        }
        .is_auth_failure());
    }

    #[test]
    fn test_request_failure_category() {
        assert!(CoreError::Timeout {
            operation: "GET /high/categ/".to_string(),
            timeout_secs: 30
        }
        .is_request_failure());
        assert!(CoreError::Transport {
            message: "reset".to_string()
        }
        .is_request_failure());
        assert!(!CoreError::unauthenticated("expired").is_request_failure());
        assert!(!CoreError::InvalidConfig {
            message: "no base".to_string()
        }
        .is_request_failure());
    }

    #[test]
    fn test_not_found_status() {
        let err = CoreError::RequestFailed {
            status: 404,
            body: "missing".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            CoreError::Transport {
                message: "reset".to_string()
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::Upstream {
            step: LedgerStep::Jobs,
            source: CoreError::RequestFailed {
                status: 500,
                body: "boom".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Ledger fetch failed at jobs");
        assert!(!err.is_empty_data());
        assert!(LedgerError::ProjectNotFound { code: 3 }.is_empty_data());
    }
}
