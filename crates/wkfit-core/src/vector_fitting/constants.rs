//! Constants for the impedance vector fitting loop
//!
//! Centralizes the numbers that define the relocation heuristic so the
//! fitted models stay reproducible.

// ============================================================================
// Iteration control
// ============================================================================

/// Default model order (number of poles)
pub const DEFAULT_ORDER: usize = 4;

/// Default cap on pole relocation iterations
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Default threshold on the maximum relative pole movement
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

// ============================================================================
// Pole relocation heuristic
// ============================================================================

/// Regularizer in the proximity weight and in the weight normalization
pub const RELOCATION_EPSILON: f64 = 1e-10;

/// Maximum fractional outward move of a pole magnitude per iteration
pub const RELOCATION_STEP: f64 = 0.1;
