use crate::error::{Error, Result};

/// 0/1 coordinate mask. Excluded coordinates get zero momentum and contribute nothing
/// to gradients, actions or precision columns, so they never move.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    weights: Vec<f64>,
}

impl Mask {
    /// Build from a 0/1 vector of length `dim`.
    pub fn from_weights(weights: Vec<f64>) -> Result<Self> {
        if let Some(i) = weights.iter().position(|&w| w != 0.0 && w != 1.0) {
            return Err(Error::InvalidParam(format!(
                "mask entries must be 0 or 1, got mask[{i}] = {}",
                weights[i]
            )));
        }
        Ok(Self { weights })
    }

    /// Build from the set of excluded coordinate indices.
    pub fn excluding(dim: usize, excluded: &[usize]) -> Result<Self> {
        let mut weights = vec![1.0; dim];
        for &i in excluded {
            if i >= dim {
                return Err(Error::IndexOutOfRange { index: i, dim });
            }
            weights[i] = 0.0;
        }
        Ok(Self { weights })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.weights.get(index).is_some_and(|&w| w != 0.0)
    }

    /// Zero out excluded entries of `values` in place.
    pub fn apply(&self, values: &mut [f64]) {
        for (x, &w) in values.iter_mut().zip(&self.weights) {
            *x *= w;
        }
    }
}

/// Apply an optional mask; `None` leaves the values untouched.
#[inline]
pub fn apply_mask(mask: Option<&Mask>, values: &mut [f64]) {
    if let Some(mask) = mask {
        mask.apply(values);
    }
}
