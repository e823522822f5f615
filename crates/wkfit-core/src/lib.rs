//! wkfit-core: stable rational impedance fitting for outlet boundary conditions
//!
//! Fits a low-order pole-residue model Z(s) = d + sum r_i / (s - p_i) with
//! Re(p_i) < 0 to a sampled impedance spectrum, for use as a Windkessel-type
//! boundary condition in flow simulations.
//!
//! ## Modules
//!
//! - `response` - Frequency response samples and input column layouts
//! - `vector_fitting` - Pole relocation fitting, fitted model, evaluation
//! - `time_domain` - Recursive convolution realization of a fitted model
//! - `export` - Boundary-condition dictionary writer
//! - `math` - Sweeps and least-squares backend

pub mod error;
pub mod export;
pub mod math;
pub mod response;
pub mod time_domain;
pub mod vector_fitting;

pub use error::{FitError, Result};
pub use response::{FrequencyResponse, ImpedanceColumns, InputFormat};
pub use vector_fitting::{fit, FitOptions, FitReport, FitStatus, FittedModel};
