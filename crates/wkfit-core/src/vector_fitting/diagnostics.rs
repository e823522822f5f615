//! Structured warnings collected during a fit

use std::fmt;

/// Non-fatal condition raised while fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Rank-deficient residue solve, minimum-norm solution used
    DegenerateSolve,
    /// Iteration cap reached before the pole movement met the tolerance
    NonConvergence,
    /// Pole with non-negative real part flipped into the left half-plane
    UnstablePole,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DegenerateSolve => "degenerate solve",
            DiagnosticKind::NonConvergence => "non-convergence",
            DiagnosticKind::UnstablePole => "unstable pole",
        };
        f.write_str(name)
    }
}

/// A warning attached to a [`FitReport`](super::FitReport)
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Zero-based iteration the condition was observed in
    pub iteration: usize,
}

impl Diagnostic {
    pub(crate) fn new(kind: DiagnosticKind, iteration: usize, message: String) -> Self {
        log::warn!("{} (iteration {}): {}", kind, iteration, message);
        Self {
            kind,
            message,
            iteration,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] iteration {}: {}",
            self.kind, self.iteration, self.message
        )
    }
}
