//! Fit options, iteration control and the main fitting routine

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

use super::algorithms::{self, ResidueSolution};
use super::constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_ORDER, DEFAULT_TOLERANCE};
use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::model::{FitQuality, FittedModel};
use crate::error::{FitError, Result};
use crate::response::FrequencyResponse;

/// Parameters of a fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Number of poles
    pub order: usize,

    /// Maximum iterations for pole relocation
    pub max_iterations: usize,

    /// Convergence threshold on the maximum relative pole movement
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl FitOptions {
    /// Default options for the given model order
    pub fn new(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(FitError::invalid("order must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(FitError::invalid("max_iterations must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(FitError::invalid(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// How the relocation loop terminated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitStatus {
    /// Pole movement dropped below the tolerance
    Converged { iterations: usize },
    /// Iteration cap hit first; the last model is still returned
    MaxIterationsReached { iterations: usize },
}

impl FitStatus {
    #[inline]
    pub fn converged(&self) -> bool {
        matches!(self, FitStatus::Converged { .. })
    }

    #[inline]
    pub fn iterations(&self) -> usize {
        match *self {
            FitStatus::Converged { iterations }
            | FitStatus::MaxIterationsReached { iterations } => iterations,
        }
    }
}

/// Everything a fit produces
#[derive(Debug, Clone)]
pub struct FitReport {
    pub model: FittedModel,
    pub status: FitStatus,
    /// Relative pole movement measured in the last iteration
    pub final_pole_change: f64,
    /// Model response at the sample frequencies
    pub fitted_response: Array1<Complex64>,
    pub quality: FitQuality,
    pub diagnostics: Vec<Diagnostic>,
}

impl FitReport {
    /// Diagnostics of one kind
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics_of(kind).next().is_some()
    }
}

/// Transient loop state, local to one fit
struct IterationState {
    poles: Array1<Complex64>,
    residues: Array1<Complex64>,
    direct_term: Complex64,
    iteration: usize,
}

fn check_response(response: &FrequencyResponse, order: usize) -> Result<(f64, f64)> {
    if response.is_empty() {
        return Err(FitError::invalid("response contains no samples"));
    }
    if response.len() < order + 1 {
        return Err(FitError::invalid(format!(
            "order {} needs at least {} frequency samples, got {}",
            order,
            order + 1,
            response.len()
        )));
    }
    if response.frequencies().iter().any(|f| !f.is_finite())
        || response.values().iter().any(|z| !z.is_finite())
    {
        return Err(FitError::invalid("response contains non-finite values"));
    }

    let f_min = response.min_frequency().unwrap_or(0.0);
    let f_max = response.max_frequency().unwrap_or(0.0);
    if f_min <= 0.0 {
        return Err(FitError::invalid(format!(
            "lowest usable frequency must be positive, got {} Hz",
            f_min
        )));
    }

    Ok((2.0 * PI * f_min, 2.0 * PI * f_max))
}

fn solve(
    s: &[Complex64],
    response: &FrequencyResponse,
    poles: &Array1<Complex64>,
    iteration: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ResidueSolution> {
    let solution = algorithms::solve_residues(s, response.values(), poles)
        .map_err(|e| FitError::invalid(format!("residue solve failed: {}", e)))?;

    if solution.is_rank_deficient() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DegenerateSolve,
            iteration,
            format!(
                "design matrix rank {} < {} unknowns (condition number {:.2e}), \
                 using minimum-norm solution",
                solution.rank, solution.unknowns, solution.condition
            ),
        ));
    }

    Ok(solution)
}

/// Fit a stable pole-residue model to an impedance spectrum
///
/// Alternates a least squares residue solve with the error-driven pole
/// relocation heuristic until the relative pole movement drops below
/// `options.tolerance` or `options.max_iterations` is reached.
///
/// On convergence the returned poles are the ones the returned residues
/// were solved for. At the iteration cap the last relocation is applied,
/// so the poles are one step ahead of the residues. Reaching the cap is
/// not an error; it is recorded as a [`DiagnosticKind::NonConvergence`]
/// diagnostic.
///
/// # Errors
/// [`FitError::InvalidInput`] for a zero order, empty or too short
/// response, non-finite data or a non-positive lowest frequency.
pub fn fit(response: &FrequencyResponse, options: &FitOptions) -> Result<FitReport> {
    options.validate()?;
    let (omega_min, omega_max) = check_response(response, options.order)?;

    let s = response.laplace();
    let mut diagnostics = Vec::new();

    let initial_poles = algorithms::init_poles(omega_min, omega_max, options.order);
    log::debug!(
        "Vector fitting: order={}, n_freq={}, initial poles {:?}",
        options.order,
        response.len(),
        initial_poles.to_vec()
    );

    let mut state = IterationState {
        poles: initial_poles,
        residues: Array1::zeros(options.order),
        direct_term: Complex64::new(0.0, 0.0),
        iteration: 0,
    };

    let (status, final_pole_change) = loop {
        let solution = solve(&s, response, &state.poles, state.iteration, &mut diagnostics)?;
        state.residues = solution.residues;
        state.direct_term = solution.direct_term;

        let new_poles = algorithms::relocate_poles(
            &s,
            response.values(),
            &state.poles,
            &state.residues,
            state.direct_term,
        );
        let pole_change = algorithms::relative_pole_change(&new_poles, &state.poles);
        log::debug!(
            "iteration {}: pole change {:.3e}",
            state.iteration,
            pole_change
        );

        let iterations = state.iteration + 1;
        if pole_change < options.tolerance {
            break (FitStatus::Converged { iterations }, pole_change);
        }

        state.poles = new_poles;
        if iterations >= options.max_iterations {
            // Relocated poles are kept; residues stay those of the previous set
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NonConvergence,
                state.iteration,
                format!(
                    "max iterations ({}) reached, final pole change {:.2e}",
                    options.max_iterations, pole_change
                ),
            ));
            break (FitStatus::MaxIterationsReached { iterations }, pole_change);
        }
        state.iteration = iterations;
    };

    for idx in algorithms::enforce_stability(&mut state.poles) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnstablePole,
            state.iteration,
            format!(
                "pole {} had non-negative real part, corrected to {:.6e}",
                idx, state.poles[idx]
            ),
        ));
    }

    let model = FittedModel::from_parts(state.direct_term, state.poles, state.residues);
    let fitted_response = model.evaluate(response.frequencies())?;
    let quality = FitQuality::between(response.values(), &fitted_response);

    match status {
        FitStatus::Converged { iterations } => log::info!(
            "Converged in {} iterations (pole change {:.2e}), relative RMSE {:.2}%",
            iterations,
            final_pole_change,
            quality.relative_rmse * 100.0
        ),
        FitStatus::MaxIterationsReached { iterations } => log::info!(
            "Stopped after {} iterations (pole change {:.2e}), relative RMSE {:.2}%",
            iterations,
            final_pole_change,
            quality.relative_rmse * 100.0
        ),
    }

    Ok(FitReport {
        model,
        status,
        final_pole_change,
        fitted_response,
        quality,
        diagnostics,
    })
}
