//! Frequency response samples
//!
//! The immutable input of the fitter: frequency points in Hz paired with
//! complex impedance values. Column layouts coming from measurement or
//! simulation exports are resolved here, once, before any fitting happens.

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::{FitError, Result};

/// Column layout of a tabulated impedance spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Magnitude [Pa·s/m³] and phase [rad]
    MagnitudePhase,
    /// Real and imaginary parts [Pa·s/m³]
    RealImag,
    /// Real-valued impedance, phase assumed zero
    RealOnly,
}

impl InputFormat {
    /// Detect the layout from column headers (case-insensitive)
    ///
    /// A `frequency` or `freq` column is required. Magnitude/phase takes
    /// precedence over real/imag, which takes precedence over `impedance`.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Option<Self> {
        let lower: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();
        let has = |name: &str| lower.iter().any(|h| h == name);

        if !has("frequency") && !has("freq") {
            return None;
        }

        if has("magnitude") && has("phase") {
            Some(InputFormat::MagnitudePhase)
        } else if has("real") && has("imag") {
            Some(InputFormat::RealImag)
        } else if has("impedance") {
            Some(InputFormat::RealOnly)
        } else {
            None
        }
    }
}

/// Impedance columns tagged by layout
#[derive(Debug, Clone, PartialEq)]
pub enum ImpedanceColumns {
    MagnitudePhase { magnitude: Vec<f64>, phase: Vec<f64> },
    RealImag { real: Vec<f64>, imag: Vec<f64> },
    RealOnly { impedance: Vec<f64> },
}

impl ImpedanceColumns {
    pub fn format(&self) -> InputFormat {
        match self {
            ImpedanceColumns::MagnitudePhase { .. } => InputFormat::MagnitudePhase,
            ImpedanceColumns::RealImag { .. } => InputFormat::RealImag,
            ImpedanceColumns::RealOnly { .. } => InputFormat::RealOnly,
        }
    }

    fn into_complex(self) -> Result<Vec<Complex64>> {
        match self {
            ImpedanceColumns::MagnitudePhase { magnitude, phase } => {
                check_len("magnitude", magnitude.len(), "phase", phase.len())?;
                Ok(magnitude
                    .iter()
                    .zip(phase.iter())
                    .map(|(&m, &ph)| Complex64::from_polar(m, ph))
                    .collect())
            }
            ImpedanceColumns::RealImag { real, imag } => {
                check_len("real", real.len(), "imag", imag.len())?;
                Ok(real
                    .iter()
                    .zip(imag.iter())
                    .map(|(&re, &im)| Complex64::new(re, im))
                    .collect())
            }
            ImpedanceColumns::RealOnly { impedance } => {
                log::warn!("Phase information not available, assuming zero phase");
                Ok(impedance.iter().map(|&re| Complex64::new(re, 0.0)).collect())
            }
        }
    }
}

fn check_len(a: &str, len_a: usize, b: &str, len_b: usize) -> Result<()> {
    if len_a != len_b {
        return Err(FitError::invalid(format!(
            "{} column has {} values but {} column has {}",
            a, len_a, b, len_b
        )));
    }
    Ok(())
}

/// A sampled complex impedance spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponse {
    /// Frequency vector in Hz
    f: Vec<f64>,
    /// Complex response at each frequency
    z: Array1<Complex64>,
}

impl FrequencyResponse {
    /// Create from frequencies (Hz) and complex values
    ///
    /// Frequencies are expected to be increasing; this is not checked.
    pub fn new(frequencies: Vec<f64>, values: Vec<Complex64>) -> Result<Self> {
        check_len("frequency", frequencies.len(), "response", values.len())?;
        Ok(Self {
            f: frequencies,
            z: Array1::from_vec(values),
        })
    }

    /// Create from a frequency column and tagged impedance columns
    pub fn from_columns(frequencies: Vec<f64>, columns: ImpedanceColumns) -> Result<Self> {
        let values = columns.into_complex()?;
        Self::new(frequencies, values)
    }

    /// Frequency vector in Hz
    #[inline]
    pub fn frequencies(&self) -> &[f64] {
        &self.f
    }

    /// Complex response values
    #[inline]
    pub fn values(&self) -> &Array1<Complex64> {
        &self.z
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.f.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }

    /// Angular frequencies ω = 2πf in rad/s
    pub fn omega(&self) -> Vec<f64> {
        self.f.iter().map(|f| 2.0 * PI * f).collect()
    }

    /// Laplace points s = jω on the imaginary axis
    pub fn laplace(&self) -> Vec<Complex64> {
        self.f
            .iter()
            .map(|f| Complex64::new(0.0, 2.0 * PI * f))
            .collect()
    }

    /// Lowest frequency usable for pole placement
    ///
    /// A leading DC sample (exactly 0 Hz) is skipped in favour of the next one.
    pub fn min_frequency(&self) -> Option<f64> {
        match self.f.first() {
            Some(&f0) if f0 == 0.0 => self.f.get(1).copied(),
            first => first.copied(),
        }
    }

    /// Highest (last) frequency in Hz
    pub fn max_frequency(&self) -> Option<f64> {
        self.f.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            InputFormat::detect(&["Frequency", "Magnitude", "Phase"]),
            Some(InputFormat::MagnitudePhase)
        );
        assert_eq!(
            InputFormat::detect(&["freq", "REAL", "imag"]),
            Some(InputFormat::RealImag)
        );
        assert_eq!(
            InputFormat::detect(&["frequency", "impedance"]),
            Some(InputFormat::RealOnly)
        );
    }

    #[test]
    fn test_detect_precedence_and_failures() {
        // magnitude/phase wins when several layouts are present
        assert_eq!(
            InputFormat::detect(&["frequency", "real", "imag", "magnitude", "phase"]),
            Some(InputFormat::MagnitudePhase)
        );
        assert_eq!(InputFormat::detect(&["time", "real", "imag"]), None);
        assert_eq!(InputFormat::detect(&["frequency", "magnitude"]), None);
    }

    #[test]
    fn test_from_columns_magnitude_phase() {
        let resp = FrequencyResponse::from_columns(
            vec![1.0, 2.0],
            ImpedanceColumns::MagnitudePhase {
                magnitude: vec![2.0, 1.0],
                phase: vec![0.0, std::f64::consts::FRAC_PI_2],
            },
        )
        .unwrap();

        assert_eq!(resp.len(), 2);
        assert_relative_eq!(resp.values()[0].re, 2.0, epsilon = 1e-12);
        assert_relative_eq!(resp.values()[1].re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(resp.values()[1].im, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_columns_real_only() {
        let columns = ImpedanceColumns::RealOnly {
            impedance: vec![5.0, 6.0, 7.0],
        };
        assert_eq!(columns.format(), InputFormat::RealOnly);

        let resp = FrequencyResponse::from_columns(vec![1.0, 2.0, 3.0], columns).unwrap();
        assert!(resp.values().iter().all(|z| z.im == 0.0));
        assert_relative_eq!(resp.values()[1].re, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let err = FrequencyResponse::from_columns(
            vec![1.0, 2.0],
            ImpedanceColumns::RealImag {
                real: vec![1.0, 2.0],
                imag: vec![0.0],
            },
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));

        assert!(FrequencyResponse::new(vec![1.0], vec![]).is_err());
    }

    #[test]
    fn test_min_frequency_skips_dc() {
        let z = vec![Complex64::new(1.0, 0.0); 3];
        let resp = FrequencyResponse::new(vec![0.0, 0.5, 1.0], z.clone()).unwrap();
        assert_eq!(resp.min_frequency(), Some(0.5));
        assert_eq!(resp.max_frequency(), Some(1.0));

        let resp = FrequencyResponse::new(vec![0.25, 0.5, 1.0], z).unwrap();
        assert_eq!(resp.min_frequency(), Some(0.25));
    }

    #[test]
    fn test_laplace_points() {
        let resp = FrequencyResponse::new(vec![1.0], vec![Complex64::new(0.0, 0.0)]).unwrap();
        let s = resp.laplace();
        assert_eq!(s[0].re, 0.0);
        assert_relative_eq!(s[0].im, 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(resp.omega()[0], 2.0 * PI, epsilon = 1e-12);
    }
}
