//! Shared primitives for all Rust crates in the access-management workspace.

#![forbid(unsafe_code)]

/// Audit context carried by every reference-store mutation.
pub mod audit;
/// Accumulated validation violations.
pub mod validation;

use thiserror::Error;

pub use audit::AuditContext;
pub use validation::{Violation, ViolationBuilder};

/// Result type used across access-management crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation was cancelled or exceeded its deadline before producing a result.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
