//! Vector fitting of impedance spectra
//!
//! Approximates a sampled impedance Z(f) by a stable rational model in
//! pole-residue form,
//!
//! ```text
//! Z(s) = d + sum_{i=1..N} r_i / (s - p_i),   Re(p_i) < 0
//! ```
//!
//! using a simplified pole relocation scheme: a least squares residue
//! solve alternates with an error-driven heuristic that moves real poles
//! along the negative real axis.
//!
//! # References
//!
//! - B. Gustavsen, A. Semlyen, "Rational Approximation of Frequency Domain Responses
//!   by Vector Fitting", IEEE Trans. Power Delivery, vol. 14, no. 3, 1999
//! - M. Fevola et al., "A vector fitting approach for the automated estimation of
//!   lumped boundary conditions of 1D circulation models", Front. Physiol. 14, 2023

pub mod algorithms;
pub mod constants;
mod core;
mod diagnostics;
mod model;

pub use crate::error::FitError;
pub use self::core::{fit, FitOptions, FitReport, FitStatus};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use model::{
    evaluate_response, max_error, mean_magnitude, rms_error, FitQuality, FittedModel,
};
