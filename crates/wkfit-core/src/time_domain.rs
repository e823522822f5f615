//! Time-domain realization of a fitted impedance
//!
//! Recursive convolution of the pole-residue model, as applied by the
//! outlet boundary condition each time step:
//!
//! ```text
//! z_i <- exp(p_i dt) z_i + r_i q (exp(p_i dt) - 1) / p_i
//! P    = d q + sum_i z_i
//! ```
//!
//! Memory is one state per pole regardless of the flow history length.
//! Only the real parts of the model parameters are used.

use crate::error::{FitError, Result};
use crate::vector_fitting::FittedModel;

/// Below this |p·dt| the convolution factor uses its Taylor expansion
const TAYLOR_THRESHOLD: f64 = 1e-6;

/// `(exp(p dt) - 1) / p`, with `dt (1 + x/2 + x²/6)` for small `x = p dt`
pub fn convolution_factor(pole: f64, dt: f64) -> f64 {
    let pdt = pole * dt;
    if pdt.abs() < TAYLOR_THRESHOLD {
        dt * (1.0 + 0.5 * pdt + pdt * pdt / 6.0)
    } else {
        (pdt.exp() - 1.0) / pole
    }
}

/// Dynamic pressure [Pa] to kinematic pressure [m²/s²]
#[inline]
pub fn kinematic(value: f64, rho: f64) -> f64 {
    value / rho
}

/// Per-pole recursive convolution state driven by outlet flow
#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveConvolution {
    poles: Vec<f64>,
    residues: Vec<f64>,
    direct_term: f64,
    state: Vec<f64>,
}

impl RecursiveConvolution {
    /// Zero-state realization of a fitted model
    pub fn new(model: &FittedModel) -> Result<Self> {
        if !model.is_fitted() {
            return Err(FitError::NotFitted);
        }
        Ok(Self {
            poles: model.poles().iter().map(|p| p.re).collect(),
            residues: model.residues().iter().map(|r| r.re).collect(),
            direct_term: model.direct_term().re,
            state: vec![0.0; model.order()],
        })
    }

    /// Restore previously saved state variables
    ///
    /// A slice whose length differs from the model order resets the state
    /// to zero instead.
    pub fn with_state(mut self, state: &[f64]) -> Self {
        if state.len() == self.poles.len() {
            self.state = state.to_vec();
        } else {
            log::warn!(
                "state variable count {} does not match order {}, reinitializing to zero",
                state.len(),
                self.poles.len()
            );
            self.state = vec![0.0; self.poles.len()];
        }
        self
    }

    #[inline]
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Advance one step with flow `q` [m³/s], returning pressure [Pa]
    pub fn step(&mut self, q: f64, dt: f64) -> f64 {
        let mut pressure = self.direct_term * q;
        for ((z, &p), &r) in self
            .state
            .iter_mut()
            .zip(self.poles.iter())
            .zip(self.residues.iter())
        {
            *z = (p * dt).exp() * *z + r * q * convolution_factor(p, dt);
            pressure += *z;
        }
        pressure
    }

    /// Instantaneous sensitivity dP/dq for a step of size `dt` [Pa·s/m³]
    pub fn effective_impedance(&self, dt: f64) -> f64 {
        self.poles
            .iter()
            .zip(self.residues.iter())
            .fold(self.direct_term, |acc, (&p, &r)| {
                acc + r * convolution_factor(p, dt)
            })
    }

    /// Pressure contributed by the decayed state alone, before adding new flow
    pub fn historical_pressure(&self, dt: f64) -> f64 {
        self.poles
            .iter()
            .zip(self.state.iter())
            .map(|(&p, &z)| (p * dt).exp() * z)
            .sum()
    }

    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|z| *z = 0.0);
    }
}
