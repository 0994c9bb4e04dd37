//! Next-event search.
//!
//! For every coordinate two candidate times are computed: the time to reach the
//! boundary at zero, and the time at which the coordinate's momentum next crosses zero
//! under the quadratic energy model. The search returns the earliest candidate over all
//! coordinates.
//!
//! Within a coordinate the boundary time is examined before the gradient time and
//! coordinates are examined in increasing index order. A candidate replaces the
//! incumbent only if it is strictly earlier, so exact ties go to whichever was examined
//! first. [`ParallelScheduler`] scans contiguous partitions and reduces them in partition
//! order under the same rule, which makes its result identical to [`SerialScheduler`].

use crate::core::event::{earliest, BounceState, BounceType, MinimumTravelInformation};
use crate::core::state::TrajectoryState;
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::ops::Range;

/// Strategy for finding the next bounce.
pub trait EventScheduler: Send + Sync {
    /// Earliest boundary or gradient event from the current state, `None` if no
    /// coordinate has an event in finite time. A NaN event time is `Error::NonFinite`.
    fn next_event(
        &self,
        state: &TrajectoryState<'_>,
        last: &BounceState,
    ) -> Result<Option<MinimumTravelInformation>>;

    fn name(&self) -> &'static str;
}

/// Single-threaded scan over all coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialScheduler;

impl EventScheduler for SerialScheduler {
    fn next_event(
        &self,
        state: &TrajectoryState<'_>,
        last: &BounceState,
    ) -> Result<Option<MinimumTravelInformation>> {
        scan_range(state, last.excluded_boundary_index(), 0..state.dim())
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

/// Partitioned scan on a dedicated rayon pool.
#[derive(Debug)]
pub struct ParallelScheduler {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl ParallelScheduler {
    /// Build a pool of `threads` workers. Errors if `threads == 0` or the pool cannot be
    /// created; there is no fallback to the serial scan.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::InvalidParam("thread count must be > 0".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("zigzag-search-{i}"))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;
        Ok(Self { pool, threads })
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl EventScheduler for ParallelScheduler {
    fn next_event(
        &self,
        state: &TrajectoryState<'_>,
        last: &BounceState,
    ) -> Result<Option<MinimumTravelInformation>> {
        let dim = state.dim();
        let excluded = last.excluded_boundary_index();
        let chunk = dim.div_ceil(self.threads).max(1);
        let partitions: Vec<Range<usize>> = (0..dim)
            .step_by(chunk)
            .map(|start| start..(start + chunk).min(dim))
            .collect();

        let minima: Vec<Option<MinimumTravelInformation>> = self.pool.install(|| {
            partitions
                .par_iter()
                .map(|range| scan_range(state, excluded, range.clone()))
                .collect::<Result<_>>()
        })?;

        Ok(minima.into_iter().fold(None, earliest))
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

/// Earliest event among coordinates in `range`.
pub fn scan_range(
    state: &TrajectoryState<'_>,
    excluded: Option<usize>,
    range: Range<usize>,
) -> Result<Option<MinimumTravelInformation>> {
    let mut best = None;
    for i in range {
        if excluded != Some(i) {
            let t = boundary_time(state.position[i], state.velocity[i]);
            best = earliest(best, MinimumTravelInformation::candidate(t, i, BounceType::Boundary)?);
        }
        let t = minimum_positive_root(
            state.action[i] / 2.0,
            -state.gradient[i],
            -state.momentum[i],
        );
        best = earliest(best, MinimumTravelInformation::candidate(t, i, BounceType::Gradient)?);
    }
    Ok(best)
}

/// A coordinate is heading toward the boundary at zero when its position and velocity
/// have opposite signs. A position pinned at zero keeps its side in the sign bit, so
/// `+0.0` with a negative velocity is heading out and hits the boundary at once. Zero
/// velocity never qualifies.
#[inline]
pub fn heading_towards_boundary(position: f64, velocity: f64) -> bool {
    velocity != 0.0 && position.is_sign_negative() != velocity.is_sign_negative()
}

/// Time to reach zero, `+inf` if not heading there.
#[inline]
pub fn boundary_time(position: f64, velocity: f64) -> f64 {
    if heading_towards_boundary(position, velocity) {
        (position / velocity).abs()
    } else {
        f64::INFINITY
    }
}

/// Least strictly positive root of `a t^2 + b t + c`, `+inf` if there is none.
///
/// A negative discriminant has no real roots. A repeated root (zero discriminant) goes
/// through the same selection. With `a == 0` the equation is linear. NaN coefficients,
/// or a discriminant that overflows to NaN, give NaN.
pub fn minimum_positive_root(a: f64, b: f64, c: f64) -> f64 {
    if a.is_nan() || b.is_nan() || c.is_nan() {
        return f64::NAN;
    }
    if a == 0.0 {
        if b == 0.0 {
            return f64::INFINITY;
        }
        let root = -c / b;
        return if root > 0.0 { root } else { f64::INFINITY };
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant.is_nan() {
        return f64::NAN;
    }
    if discriminant < 0.0 {
        return f64::INFINITY;
    }
    let sqrt_discriminant = discriminant.sqrt();
    let r1 = (-b - sqrt_discriminant) / (2.0 * a);
    let r2 = (-b + sqrt_discriminant) / (2.0 * a);
    let (smaller, larger) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };

    if smaller > 0.0 {
        smaller
    } else if larger > 0.0 {
        larger
    } else {
        f64::INFINITY
    }
}
