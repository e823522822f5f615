//! Fitted pole-residue model and its evaluation
//!
//! Z(s) = d + sum_i r_i / (s - p_i), evaluated on s = j·2πf.

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

use super::algorithms;
use crate::error::{FitError, Result};
use crate::response::FrequencyResponse;

/// Evaluate the pole-residue sum at the given Laplace points
pub fn evaluate_response(
    poles: &Array1<Complex64>,
    residues: &Array1<Complex64>,
    direct_term: Complex64,
    s: &[Complex64],
) -> Array1<Complex64> {
    s.iter()
        .map(|&s_k| {
            poles
                .iter()
                .zip(residues.iter())
                .fold(direct_term, |acc, (&p, &r)| acc + r / (s_k - p))
        })
        .collect()
}

/// Immutable result of a successful fit
///
/// The `Default` value is an unfitted placeholder (order 0) that every
/// evaluation rejects with [`FitError::NotFitted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FittedModel {
    poles: Array1<Complex64>,
    residues: Array1<Complex64>,
    direct_term: Complex64,
}

impl FittedModel {
    /// Build a model from known parameters
    ///
    /// `poles` and `residues` must be non-empty and of equal length.
    /// Stability is not checked here; see [`FittedModel::poles_are_stable`].
    pub fn new(
        direct_term: Complex64,
        poles: Vec<Complex64>,
        residues: Vec<Complex64>,
    ) -> Result<Self> {
        if poles.is_empty() {
            return Err(FitError::invalid("model order must be at least 1"));
        }
        if poles.len() != residues.len() {
            return Err(FitError::invalid(format!(
                "{} poles but {} residues",
                poles.len(),
                residues.len()
            )));
        }
        Ok(Self::from_parts(
            direct_term,
            Array1::from_vec(poles),
            Array1::from_vec(residues),
        ))
    }

    pub(crate) fn from_parts(
        direct_term: Complex64,
        poles: Array1<Complex64>,
        residues: Array1<Complex64>,
    ) -> Self {
        Self {
            poles,
            residues,
            direct_term,
        }
    }

    /// Number of poles
    #[inline]
    pub fn order(&self) -> usize {
        self.poles.len()
    }

    /// Poles in rad/s
    #[inline]
    pub fn poles(&self) -> &Array1<Complex64> {
        &self.poles
    }

    /// Residues in Pa/m³, positionally paired with [`FittedModel::poles`]
    #[inline]
    pub fn residues(&self) -> &Array1<Complex64> {
        &self.residues
    }

    /// Direct (feedthrough) term in Pa·s/m³
    #[inline]
    pub fn direct_term(&self) -> Complex64 {
        self.direct_term
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        !self.poles.is_empty()
    }

    /// True if the model is fitted and every pole has a negative real part
    pub fn poles_are_stable(&self) -> bool {
        self.is_fitted() && algorithms::poles_are_stable(&self.poles)
    }

    /// Complex response at the given frequencies (Hz)
    pub fn evaluate(&self, freqs: &[f64]) -> Result<Array1<Complex64>> {
        if !self.is_fitted() {
            return Err(FitError::NotFitted);
        }
        let s: Vec<Complex64> = freqs
            .iter()
            .map(|f| Complex64::new(0.0, 2.0 * PI * f))
            .collect();
        Ok(evaluate_response(
            &self.poles,
            &self.residues,
            self.direct_term,
            &s,
        ))
    }

    /// Response magnitude |Z| at the given frequencies (Hz)
    pub fn evaluate_magnitude(&self, freqs: &[f64]) -> Result<Array1<f64>> {
        Ok(self.evaluate(freqs)?.mapv(|z| z.norm()))
    }

    /// Error metrics of this model against sampled data
    pub fn quality(&self, response: &FrequencyResponse) -> Result<FitQuality> {
        let fitted = self.evaluate(response.frequencies())?;
        Ok(FitQuality::between(response.values(), &fitted))
    }
}

/// Fit error metrics, in the units of the response (Pa·s/m³)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitQuality {
    /// sqrt(mean |Z - Z_fit|²)
    pub rmse: f64,
    /// max |Z - Z_fit|
    pub max_error: f64,
    /// rmse / mean |Z| (a fraction, not a percentage)
    pub relative_rmse: f64,
}

impl FitQuality {
    /// Compare target data with a model response of the same length
    pub fn between(target: &Array1<Complex64>, fitted: &Array1<Complex64>) -> Self {
        let rmse = rms_error(fitted, target);

        Self {
            rmse,
            max_error: max_error(fitted, target),
            relative_rmse: rmse / mean_magnitude(target),
        }
    }
}

/// Mean of |Z| over all samples, NaN when empty
pub fn mean_magnitude(response: &Array1<Complex64>) -> f64 {
    if response.is_empty() {
        return f64::NAN;
    }
    response.iter().map(|z| z.norm()).sum::<f64>() / response.len() as f64
}

/// RMS error between model and target responses
pub fn rms_error(model_response: &Array1<Complex64>, target_response: &Array1<Complex64>) -> f64 {
    if model_response.len() != target_response.len() || model_response.is_empty() {
        return f64::NAN;
    }

    let n = model_response.len() as f64;
    let error_sum: f64 = model_response
        .iter()
        .zip(target_response.iter())
        .map(|(m, t)| (m - t).norm_sqr())
        .sum();

    (error_sum / n).sqrt()
}

/// Maximum absolute error between model and target responses
pub fn max_error(model_response: &Array1<Complex64>, target_response: &Array1<Complex64>) -> f64 {
    if model_response.len() != target_response.len() || model_response.is_empty() {
        return f64::NAN;
    }

    model_response
        .iter()
        .zip(target_response.iter())
        .map(|(m, t)| (m - t).norm())
        .fold(0.0, f64::max)
}
