//! Mathematical helpers module
//!
//! Sweep generation and the least-squares backend used by the fitter.

pub mod linalg;

/// `n` points evenly spaced over `[start, end]` (inclusive)
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// `n` points logarithmically spaced over `[start, end]` (inclusive)
///
/// Both bounds must be positive; otherwise falls back to linear spacing.
/// A single point sits at `start`.
pub fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if start <= 0.0 || end <= 0.0 {
        return linspace(start, end, n);
    }
    if n == 1 {
        return vec![start];
    }
    linspace(start.log10(), end.log10(), n)
        .iter()
        .map(|x| 10f64.powf(*x))
        .collect()
}
