use crate::error::{Error, Result};

/// Per-coordinate preconditioning used for the momentum draw and the implied speed.
pub trait MassModel: Send + Sync {
    /// Positive, finite mass for every coordinate.
    fn mass(&self) -> &[f64];

    fn dimension(&self) -> usize {
        self.mass().len()
    }
}

/// Diagonal mass with validated entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalMass {
    mass: Vec<f64>,
}

impl DiagonalMass {
    /// Errors: `Error::InvalidParam` if empty or if any entry is non-positive or non-finite.
    pub fn new(mass: Vec<f64>) -> Result<Self> {
        if mass.is_empty() {
            return Err(Error::InvalidParam("mass must have at least one entry".into()));
        }
        if let Some(i) = mass.iter().position(|&w| !w.is_finite() || w <= 0.0) {
            return Err(Error::InvalidParam(format!(
                "mass must be finite and > 0, got mass[{i}] = {}",
                mass[i]
            )));
        }
        Ok(Self { mass })
    }

    /// Unit mass in `dim` dimensions.
    pub fn unit(dim: usize) -> Result<Self> {
        Self::new(vec![1.0; dim])
    }
}

impl MassModel for DiagonalMass {
    fn mass(&self) -> &[f64] {
        &self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mass_rejected() {
        let err = DiagonalMass::new(vec![1.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("mass[1]"));
    }

    #[test]
    fn unit_mass() -> Result<()> {
        let m = DiagonalMass::unit(3)?;
        assert_eq!(m.mass(), &[1.0, 1.0, 1.0]);
        assert_eq!(m.dimension(), 3);
        Ok(())
    }

    #[test]
    fn empty_mass_rejected() {
        assert!(DiagonalMass::unit(0).is_err());
    }
}
