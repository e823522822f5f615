//! Core algorithms for impedance vector fitting
//!
//! Implements pole initialization, residue fitting (least squares on the
//! stacked real/imaginary system), the error-driven pole relocation
//! heuristic and the stability correction pass.
//!
//! The relocation step is a coarse heuristic, not the relaxed
//! vector-fitting sub-problem of Gustavsen & Semlyen: it only ever moves
//! pole magnitudes outward along the negative real axis and can oscillate
//! or stagnate on ill-conditioned data. Its exact behaviour is kept so
//! fitted models are reproducible.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::constants::{RELOCATION_EPSILON, RELOCATION_STEP};
use super::model::evaluate_response;
use crate::math::{self, linalg};

/// Result of a residue solve for a fixed pole set
#[derive(Debug, Clone)]
pub struct ResidueSolution {
    pub direct_term: Complex64,
    pub residues: Array1<Complex64>,
    /// Numerical rank of the stacked design matrix
    pub rank: usize,
    /// Number of unknowns (order + 1)
    pub unknowns: usize,
    /// Condition number of the design matrix, reported on degenerate solves
    pub condition: f64,
}

impl ResidueSolution {
    #[inline]
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.unknowns
    }
}

/// Initialize starting poles across the angular frequency band
///
/// Returns `order` negative real poles whose magnitudes are log-spaced over
/// `[omega_min, omega_max]`. A first-order model gets a single pole at
/// `-omega_min`.
pub fn init_poles(omega_min: f64, omega_max: f64, order: usize) -> Array1<Complex64> {
    math::logspace(omega_min, omega_max, order)
        .into_iter()
        .map(|w| Complex64::new(-w, 0.0))
        .collect()
}

/// Fit the direct term and residues for fixed poles
///
/// Builds `A = [1, 1/(s - p_1), ..., 1/(s - p_N)]`, stacks `[Re A; Im A]`
/// against `[Re Z; Im Z]` and solves in the least squares sense. A
/// rank-deficient system returns the minimum-norm solution; check
/// [`ResidueSolution::is_rank_deficient`].
pub fn solve_residues(
    s: &[Complex64],
    z: &Array1<Complex64>,
    poles: &Array1<Complex64>,
) -> Result<ResidueSolution, &'static str> {
    let n_freqs = s.len();
    let n_poles = poles.len();

    if n_freqs == 0 {
        return Err("Empty input");
    }
    if z.len() != n_freqs {
        return Err("Dimension mismatch");
    }

    let one = Complex64::new(1.0, 0.0);
    let mut a_matrix = Array2::<Complex64>::zeros((n_freqs, n_poles + 1));
    for (f_idx, &s_f) in s.iter().enumerate() {
        a_matrix[[f_idx, 0]] = one;
        for (p_idx, &pole) in poles.iter().enumerate() {
            a_matrix[[f_idx, p_idx + 1]] = one / (s_f - pole);
        }
    }

    let a_ri = linalg::stack_real_imag_matrix(&a_matrix);
    let b_ri = linalg::stack_real_imag_vector(z);

    let result = linalg::lstsq(&a_ri, &b_ri)?;
    let x = &result.solution;

    Ok(ResidueSolution {
        direct_term: Complex64::new(x[0], 0.0),
        residues: x[1..].iter().map(|&r| Complex64::new(r, 0.0)).collect(),
        rank: result.rank,
        unknowns: n_poles + 1,
        condition: result.condition,
    })
}

/// Per-pole weight: accumulated fit error near the pole's frequency
///
/// `w_i = sum_k |Z_k - Z_fit,k| / (| omega_k - |p_i| | + eps)`
pub fn relocation_weights(
    s: &[Complex64],
    z: &Array1<Complex64>,
    poles: &Array1<Complex64>,
    residues: &Array1<Complex64>,
    direct_term: Complex64,
) -> Vec<f64> {
    let z_fit = evaluate_response(poles, residues, direct_term, s);
    let error: Vec<f64> = z
        .iter()
        .zip(z_fit.iter())
        .map(|(data, fit)| (data - fit).norm())
        .collect();

    poles
        .iter()
        .map(|pole| {
            let pole_omega = pole.norm();
            s.iter()
                .zip(error.iter())
                .map(|(s_k, e_k)| e_k / ((s_k.im.abs() - pole_omega).abs() + RELOCATION_EPSILON))
                .sum::<f64>()
        })
        .collect()
}

/// Move poles outward in proportion to the local fit error they sit near
///
/// Each pole magnitude grows by at most `RELOCATION_STEP` (10%) per call;
/// the result is forced onto the negative real axis.
pub fn relocate_poles(
    s: &[Complex64],
    z: &Array1<Complex64>,
    poles: &Array1<Complex64>,
    residues: &Array1<Complex64>,
    direct_term: Complex64,
) -> Array1<Complex64> {
    let weights = relocation_weights(s, z, poles, residues, direct_term);
    let max_weight = weights.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + RELOCATION_EPSILON;

    poles
        .iter()
        .zip(weights.iter())
        .map(|(&pole, &w)| {
            let scaled = pole * (1.0 + RELOCATION_STEP * w / max_weight);
            Complex64::new(-scaled.norm(), 0.0)
        })
        .collect()
}

/// Maximum relative movement `|p_new - p_old| / |p_old|` over all poles
pub fn relative_pole_change(new_poles: &Array1<Complex64>, old_poles: &Array1<Complex64>) -> f64 {
    new_poles
        .iter()
        .zip(old_poles.iter())
        .map(|(new, old)| (new - old).norm() / old.norm())
        .fold(0.0, f64::max)
}

/// Check that every pole lies strictly in the left half-plane
pub fn poles_are_stable(poles: &Array1<Complex64>) -> bool {
    poles.iter().all(|p| p.re < 0.0)
}

/// Replace any pole with non-negative real part by `-|p|`
///
/// Returns the indices that were corrected. Residues are not touched.
pub fn enforce_stability(poles: &mut Array1<Complex64>) -> Vec<usize> {
    let mut corrected = Vec::new();
    for (idx, pole) in poles.iter_mut().enumerate() {
        if pole.re >= 0.0 {
            *pole = Complex64::new(-pole.norm(), 0.0);
            corrected.push(idx);
        }
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn laplace(freqs: &[f64]) -> Vec<Complex64> {
        freqs
            .iter()
            .map(|f| Complex64::new(0.0, 2.0 * PI * f))
            .collect()
    }

    #[test]
    fn test_init_poles_log_spaced() {
        let poles = init_poles(1.0, 1000.0, 4);

        assert_eq!(poles.len(), 4);
        assert_relative_eq!(poles[0].re, -1.0, epsilon = 1e-10);
        assert_relative_eq!(poles[1].re, -10.0, epsilon = 1e-9);
        assert_relative_eq!(poles[2].re, -100.0, epsilon = 1e-8);
        assert_relative_eq!(poles[3].re, -1000.0, epsilon = 1e-7);
        assert!(poles.iter().all(|p| p.im == 0.0));
    }

    #[test]
    fn test_init_poles_single() {
        let poles = init_poles(2.5, 100.0, 1);
        assert_eq!(poles.len(), 1);
        assert_eq!(poles[0], Complex64::new(-2.5, 0.0));
    }

    #[test]
    fn test_solve_residues_exact_model() {
        let freqs = math::logspace(0.1, 20.0, 50);
        let s = laplace(&freqs);
        let poles = Array1::from_vec(vec![Complex64::new(-5.0, 0.0), Complex64::new(-50.0, 0.0)]);
        let residues =
            Array1::from_vec(vec![Complex64::new(100.0, 0.0), Complex64::new(500.0, 0.0)]);
        let z = evaluate_response(&poles, &residues, Complex64::new(10.0, 0.0), &s);

        let sol = solve_residues(&s, &z, &poles).unwrap();

        assert!(!sol.is_rank_deficient());
        assert_relative_eq!(sol.direct_term.re, 10.0, epsilon = 1e-6);
        assert_relative_eq!(sol.residues[0].re, 100.0, epsilon = 1e-5);
        assert_relative_eq!(sol.residues[1].re, 500.0, epsilon = 1e-5);
        assert!(sol.residues.iter().all(|r| r.im == 0.0));
    }

    #[test]
    fn test_solve_residues_duplicate_poles_min_norm() {
        let freqs = math::logspace(0.1, 20.0, 30);
        let s = laplace(&freqs);
        let true_poles = Array1::from_vec(vec![Complex64::new(-5.0, 0.0)]);
        let z = evaluate_response(
            &true_poles,
            &Array1::from_vec(vec![Complex64::new(100.0, 0.0)]),
            Complex64::new(1.0, 0.0),
            &s,
        );

        let poles = Array1::from_vec(vec![Complex64::new(-5.0, 0.0), Complex64::new(-5.0, 0.0)]);
        let sol = solve_residues(&s, &z, &poles).unwrap();

        assert!(sol.is_rank_deficient());
        // Minimum-norm splits the residue evenly between identical columns
        assert_relative_eq!(sol.residues[0].re, 50.0, epsilon = 1e-4);
        assert_relative_eq!(sol.residues[1].re, 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_relocate_poles_moves_outward_at_most_ten_percent() {
        let freqs = math::logspace(0.1, 20.0, 40);
        let s = laplace(&freqs);
        let z: Array1<Complex64> = s
            .iter()
            .map(|&s_k| Complex64::new(10.0, 0.0) + 100.0 / (s_k + 5.0) + 500.0 / (s_k + 50.0))
            .collect();
        let poles = init_poles(2.0 * PI * 0.1, 2.0 * PI * 20.0, 2);
        let sol = solve_residues(&s, &z, &poles).unwrap();

        let new_poles = relocate_poles(&s, &z, &poles, &sol.residues, sol.direct_term);

        for (new, old) in new_poles.iter().zip(poles.iter()) {
            assert!(new.re < 0.0);
            assert_eq!(new.im, 0.0);
            assert!(new.norm() >= old.norm());
            assert!(new.norm() <= old.norm() * 1.1 + 1e-12);
        }
        // The pole carrying the largest weight moves the full step
        let change = relative_pole_change(&new_poles, &poles);
        assert_relative_eq!(change, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_relocate_poles_perfect_fit_stays_put() {
        let s = laplace(&[1.0, 2.0, 3.0]);
        let poles = Array1::from_vec(vec![Complex64::new(-3.0, 0.0)]);
        let residues = Array1::from_vec(vec![Complex64::new(2.0, 0.0)]);
        let d = Complex64::new(1.0, 0.0);
        let z = evaluate_response(&poles, &residues, d, &s);

        let new_poles = relocate_poles(&s, &z, &poles, &residues, d);
        assert_eq!(relative_pole_change(&new_poles, &poles), 0.0);
    }

    #[test]
    fn test_relative_pole_change() {
        let old = Array1::from_vec(vec![Complex64::new(-10.0, 0.0), Complex64::new(-100.0, 0.0)]);
        let new = Array1::from_vec(vec![Complex64::new(-10.5, 0.0), Complex64::new(-101.0, 0.0)]);
        assert_relative_eq!(relative_pole_change(&new, &old), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_enforce_stability() {
        let mut poles = Array1::from_vec(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 3.0),
        ]);
        assert!(!poles_are_stable(&poles));

        let corrected = enforce_stability(&mut poles);

        assert_eq!(corrected, vec![1, 2]);
        assert_eq!(poles[0], Complex64::new(-1.0, 0.0));
        assert_eq!(poles[1], Complex64::new(-2.0, 0.0));
        assert_relative_eq!(poles[2].re, -3.0, epsilon = 1e-12);
        assert!(poles_are_stable(&poles));
    }
}
