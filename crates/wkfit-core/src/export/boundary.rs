//! `vectorFittingImpedance` boundary-condition writer
//!
//! Writes the fitted parameters in the order the outlet condition reads
//! them: order, direct term [Pa·s/m³], poles [rad/s], residues [Pa/m³],
//! followed by the fluid density and the kinematic initial pressure.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::error::FitError;
use crate::vector_fitting::FittedModel;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Pressure-flow coupling of the outlet condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouplingMode {
    Explicit,
    #[default]
    Implicit,
}

impl CouplingMode {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "explicit" => Some(CouplingMode::Explicit),
            "implicit" => Some(CouplingMode::Implicit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CouplingMode::Explicit => "explicit",
            CouplingMode::Implicit => "implicit",
        }
    }
}

/// Caller-supplied fields of the outlet patch entry
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
    /// Patch name
    pub patch_name: String,
    /// Flux field name
    pub phi: String,
    /// Velocity field name
    pub u: String,
    pub coupling_mode: CouplingMode,
    /// Fluid density [kg/m³]
    pub rho: f64,
    /// Reference (initial) pressure [Pa]
    pub p0: f64,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        Self {
            patch_name: "outlet".to_string(),
            phi: "phi".to_string(),
            u: "U".to_string(),
            coupling_mode: CouplingMode::Implicit,
            // blood
            rho: 1060.0,
            // 100 mmHg
            p0: 13332.0,
        }
    }
}

impl BoundaryCondition {
    pub fn new(patch_name: impl Into<String>) -> Self {
        Self {
            patch_name: patch_name.into(),
            ..Self::default()
        }
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_p0(mut self, p0: f64) -> Self {
        self.p0 = p0;
        self
    }

    pub fn with_coupling_mode(mut self, mode: CouplingMode) -> Self {
        self.coupling_mode = mode;
        self
    }

    /// Kinematic initial pressure p0 / rho [m²/s²]
    pub fn kinematic_p0(&self) -> f64 {
        self.p0 / self.rho
    }

    /// Pair these settings with a fitted model for formatting
    pub fn entry<'a>(&'a self, model: &'a FittedModel) -> Result<BoundaryEntry<'a>, FitError> {
        if !model.is_fitted() {
            return Err(FitError::NotFitted);
        }
        Ok(BoundaryEntry {
            settings: self,
            model,
        })
    }

    /// Render the patch entry as a string
    pub fn render(&self, model: &FittedModel) -> Result<String, ExportError> {
        Ok(self.entry(model)?.to_string())
    }

    /// Write the patch entry to a writer
    pub fn write_to<W: Write>(
        &self,
        model: &FittedModel,
        writer: &mut W,
    ) -> Result<(), ExportError> {
        let entry = self.entry(model)?;
        write!(writer, "{}", entry)?;
        Ok(())
    }

    /// Write the patch entry to a file
    pub fn write<P: AsRef<Path>>(&self, path: P, model: &FittedModel) -> Result<(), ExportError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(model, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// A boundary condition bound to a fitted model
#[derive(Debug, Clone, Copy)]
pub struct BoundaryEntry<'a> {
    settings: &'a BoundaryCondition,
    model: &'a FittedModel,
}

/// Scientific notation with 10 fractional digits and a signed two-digit exponent
fn sci(x: f64) -> String {
    let s = format!("{:.10e}", x);
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(e) => format!("{}e{}{:02}", mantissa, if e < 0 { '-' } else { '+' }, e.abs()),
            Err(_) => s,
        },
        None => s,
    }
}

fn join(values: impl Iterator<Item = f64>) -> String {
    values.map(sci).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for BoundaryEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bc = self.settings;
        let model = self.model;

        writeln!(f, "    {}", bc.patch_name)?;
        writeln!(f, "    {{")?;
        writeln!(f, "        type                  vectorFittingImpedance;")?;
        writeln!(f, "        phi                   {};", bc.phi)?;
        writeln!(f, "        U                     {};", bc.u)?;
        writeln!(f, "        couplingMode          {};", bc.coupling_mode.as_str())?;
        writeln!(f, "        order                 {};", model.order())?;
        writeln!(f)?;
        writeln!(
            f,
            "        directTerm            {};  // [Pa·s/m³]",
            sci(model.direct_term().re)
        )?;
        writeln!(
            f,
            "        poles                 ({});  // [rad/s]",
            join(model.poles().iter().map(|p| p.re))
        )?;
        writeln!(
            f,
            "        residues              ({});  // [Pa/m³]",
            join(model.residues().iter().map(|r| r.re))
        )?;
        writeln!(f)?;
        writeln!(f, "        rho                   {:?};  // [kg/m³]", bc.rho)?;
        writeln!(f)?;
        writeln!(
            f,
            "        value                 uniform {:.6};  // [m²/s²] kinematic = {:?}/rho",
            bc.kinematic_p0(),
            bc.p0
        )?;
        writeln!(f, "    }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn model() -> FittedModel {
        FittedModel::new(
            Complex64::new(10.0, 0.0),
            vec![Complex64::new(-5.0, 0.0), Complex64::new(-50.0, 0.0)],
            vec![Complex64::new(100.0, 0.0), Complex64::new(500.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_sci_format() {
        assert_eq!(sci(10.0), "1.0000000000e+01");
        assert_eq!(sci(-0.00125), "-1.2500000000e-03");
        assert_eq!(sci(0.0), "0.0000000000e+00");
    }

    #[test]
    fn test_render_field_order() {
        let text = BoundaryCondition::new("outlet1").render(&model()).unwrap();

        let order = text.find("order").unwrap();
        let direct = text.find("directTerm").unwrap();
        let poles = text.find("poles").unwrap();
        let residues = text.find("residues").unwrap();
        let rho = text.find("rho ").unwrap();
        assert!(order < direct && direct < poles && poles < residues && residues < rho);

        assert!(text.starts_with("    outlet1\n    {\n"));
        assert!(text.contains("type                  vectorFittingImpedance;"));
        assert!(text.contains("couplingMode          implicit;"));
        assert!(text.contains("order                 2;"));
        assert!(text.contains("directTerm            1.0000000000e+01;"));
        assert!(text.contains("poles                 (-5.0000000000e+00 -5.0000000000e+01);"));
        assert!(text.contains("residues              (1.0000000000e+02 5.0000000000e+02);"));
        assert!(text.contains("rho                   1060.0;"));
        assert!(text.contains("value                 uniform 12.577358;"));
        assert!(text.ends_with("    }\n"));
    }

    #[test]
    fn test_render_custom_fluid() {
        let bc = BoundaryCondition::new("outlet")
            .with_rho(1000.0)
            .with_p0(10000.0)
            .with_coupling_mode(CouplingMode::Explicit);
        let text = bc.render(&model()).unwrap();

        assert!(text.contains("couplingMode          explicit;"));
        assert!(text.contains("uniform 10.000000;"));
    }

    #[test]
    fn test_render_unfitted_model() {
        let err = BoundaryCondition::default()
            .render(&FittedModel::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::Fit(FitError::NotFitted)));
    }

    #[test]
    fn test_write_to_matches_render() {
        let bc = BoundaryCondition::default();
        let mut buf = Vec::new();
        bc.write_to(&model(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), bc.render(&model()).unwrap());
    }

    #[test]
    fn test_coupling_mode_from_str() {
        assert_eq!(CouplingMode::from_str("Implicit"), Some(CouplingMode::Implicit));
        assert_eq!(CouplingMode::from_str("EXPLICIT"), Some(CouplingMode::Explicit));
        assert_eq!(CouplingMode::from_str("semi"), None);
    }
}
