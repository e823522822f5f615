//! Error types for impedance fitting

use thiserror::Error;

/// Result type alias using [`FitError`]
pub type Result<T> = std::result::Result<T, FitError>;

/// Fatal fitting and evaluation errors
///
/// Recoverable conditions (rank-deficient solves, non-convergence,
/// corrected poles) are not errors; they are reported as
/// [`Diagnostic`](crate::vector_fitting::Diagnostic)s on the fit report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Input rejected before fitting started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model evaluated or exported before a successful fit
    #[error("Model not fitted yet")]
    NotFitted,
}

impl FitError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FitError::InvalidInput(message.into())
    }
}
