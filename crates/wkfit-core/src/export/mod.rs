//! Boundary-condition export module
//!
//! Renders a fitted model as a `vectorFittingImpedance` outlet patch entry.

pub mod boundary;

pub use boundary::{BoundaryCondition, BoundaryEntry, CouplingMode, ExportError};
