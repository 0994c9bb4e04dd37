use crate::core::mask::{apply_mask, Mask};
use crate::core::provider::{PrecisionColumnProvider, PrecisionProductProvider};
use crate::core::state::{check_finite, check_len};
use crate::error::Result;
use std::sync::Arc;

/// Keeps `action = precision · velocity` current after one coordinate's velocity flips.
pub trait ActionUpdate: Send + Sync {
    /// `velocity` is the post-flip velocity; `index` the coordinate that flipped.
    fn update_action(&self, action: &mut [f64], velocity: &[f64], index: usize) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Rank-1 correction from a single precision column:
/// `action[k] += 2 * velocity[index] * column[k]`.
pub struct RankOneColumnUpdate {
    columns: Arc<dyn PrecisionColumnProvider>,
    mask: Option<Mask>,
}

impl RankOneColumnUpdate {
    pub fn new(columns: Arc<dyn PrecisionColumnProvider>, mask: Option<Mask>) -> Self {
        Self { columns, mask }
    }
}

impl ActionUpdate for RankOneColumnUpdate {
    fn update_action(&self, action: &mut [f64], velocity: &[f64], index: usize) -> Result<()> {
        let mut column = self.columns.column(index)?;
        check_len("precision column", action.len(), column.len())?;
        check_finite("precision column", &column)?;
        apply_mask(self.mask.as_ref(), &mut column);

        let two_v = 2.0 * velocity[index];
        for (a, &c) in action.iter_mut().zip(&column) {
            *a += two_v * c;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rank-one-column"
    }
}

/// Recomputes the full product every event. Debugging aid for checking the rank-1 path,
/// not part of the default configuration; far more expensive.
pub struct FullProductUpdate {
    product: Arc<dyn PrecisionProductProvider>,
    mask: Option<Mask>,
}

impl FullProductUpdate {
    pub fn new(product: Arc<dyn PrecisionProductProvider>, mask: Option<Mask>) -> Self {
        Self { product, mask }
    }
}

impl ActionUpdate for FullProductUpdate {
    fn update_action(&self, action: &mut [f64], velocity: &[f64], _index: usize) -> Result<()> {
        let mut fresh = self.product.product_with_precision(velocity)?;
        check_len("precision product", action.len(), fresh.len())?;
        check_finite("precision product", &fresh)?;
        apply_mask(self.mask.as_ref(), &mut fresh);
        action.copy_from_slice(&fresh);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "full-product"
    }
}
