use crate::config::{ActionUpdateKind, TravelTimePolicy, ZigZagConfig};
use crate::core::event::{BounceState, BounceType, MinimumTravelInformation};
use crate::core::mask::{apply_mask, Mask};
use crate::core::mass::MassModel;
use crate::core::provider::{GradientProvider, PrecisionColumnProvider, PrecisionProductProvider};
use crate::core::report::TrajectoryReport;
use crate::core::scheduler::{EventScheduler, ParallelScheduler, SerialScheduler};
use crate::core::state::{check_len, velocity_from_momentum, TrajectoryState};
use crate::core::update::{ActionUpdate, FullProductUpdate, RankOneColumnUpdate};
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use rand_distr::Exp1;
use std::sync::Arc;
use tracing::{debug, trace};

/// External collaborators of the engine. All are read-only during a trajectory.
#[derive(Clone)]
pub struct Collaborators {
    pub gradient: Arc<dyn GradientProvider>,
    pub product: Arc<dyn PrecisionProductProvider>,
    pub columns: Arc<dyn PrecisionColumnProvider>,
    pub mass: Arc<dyn MassModel>,
    pub mask: Option<Mask>,
}

impl Collaborators {
    /// All three oracles served by one target.
    pub fn from_target<T>(target: Arc<T>, mass: Arc<dyn MassModel>, mask: Option<Mask>) -> Self
    where
        T: GradientProvider + PrecisionProductProvider + PrecisionColumnProvider + 'static,
    {
        Self {
            gradient: target.clone(),
            product: target.clone(),
            columns: target,
            mass,
            mask,
        }
    }

    /// Common dimension of every collaborator.
    pub fn dimension(&self) -> Result<usize> {
        let dim = self.mass.dimension();
        if dim == 0 {
            return Err(Error::InvalidParam("dimension must be > 0".into()));
        }
        check_len("gradient provider", dim, self.gradient.dimension())?;
        check_len("precision product provider", dim, self.product.dimension())?;
        check_len("precision column provider", dim, self.columns.dimension())?;
        if let Some(mask) = &self.mask {
            check_len("mask", dim, mask.dimension())?;
        }
        Ok(dim)
    }
}

/// Event counts for one trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectorySummary {
    pub travel_time: f64,
    pub boundary_events: usize,
    pub gradient_events: usize,
}

impl TrajectorySummary {
    #[inline]
    pub fn events(&self) -> usize {
        self.boundary_events + self.gradient_events
    }
}

/// Zig-Zag trajectory integrator.
///
/// One call to [`operate`](Self::operate) draws momentum and a travel time, then runs
/// the event loop: find the earliest bounce, advance every array to it in closed form,
/// reflect, refresh gradient and action, repeat until the travel time is spent. The
/// mutated position is the proposal; accept/reject is left to the caller.
pub struct ParticleOperator {
    dim: usize,
    gradient: Arc<dyn GradientProvider>,
    product: Arc<dyn PrecisionProductProvider>,
    mass: Arc<dyn MassModel>,
    mask: Option<Mask>,
    scheduler: Box<dyn EventScheduler>,
    action_update: Box<dyn ActionUpdate>,
    travel_time: TravelTimePolicy,
    record_trajectory: bool,
    rng: StdRng,
    last_report: Option<TrajectoryReport>,
}

impl ParticleOperator {
    /// Build an operator with the scheduler and action-update strategy selected by `config`.
    ///
    /// Errors:
    /// - `Error::InvalidParam` / `Error::DimensionMismatch` for bad configuration or collaborators.
    /// - `Error::ThreadPool` if the search pool cannot be created.
    pub fn new(collaborators: Collaborators, config: &ZigZagConfig) -> Result<Self> {
        let scheduler: Box<dyn EventScheduler> = match config.threads {
            Some(n) if n > 1 => Box::new(ParallelScheduler::new(n)?),
            _ => Box::new(SerialScheduler),
        };
        let action_update: Box<dyn ActionUpdate> = match config.action_update {
            ActionUpdateKind::RankOneColumn => Box::new(RankOneColumnUpdate::new(
                collaborators.columns.clone(),
                collaborators.mask.clone(),
            )),
            ActionUpdateKind::FullProduct => Box::new(FullProductUpdate::new(
                collaborators.product.clone(),
                collaborators.mask.clone(),
            )),
        };
        Self::with_strategies(collaborators, config, scheduler, action_update)
    }

    /// Build an operator with explicitly supplied strategies.
    pub fn with_strategies(
        collaborators: Collaborators,
        config: &ZigZagConfig,
        scheduler: Box<dyn EventScheduler>,
        action_update: Box<dyn ActionUpdate>,
    ) -> Result<Self> {
        config.validate()?;
        let dim = collaborators.dimension()?;

        let rng: StdRng = match config.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        Ok(Self {
            dim,
            gradient: collaborators.gradient,
            product: collaborators.product,
            mass: collaborators.mass,
            mask: collaborators.mask,
            scheduler,
            action_update,
            travel_time: config.travel_time,
            record_trajectory: config.record_trajectory,
            rng,
            last_report: None,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn scheduler_name(&self) -> &'static str {
        self.scheduler.name()
    }

    #[inline]
    pub fn action_update_name(&self) -> &'static str {
        self.action_update.name()
    }

    /// Report of the most recent trajectory, if recording is enabled.
    pub fn last_report(&self) -> Option<&TrajectoryReport> {
        self.last_report.as_ref()
    }

    /// Signed-exponential momentum scaled by `sqrt(mass)`; masked coordinates are zero.
    pub fn draw_momentum(&mut self) -> Vec<f64> {
        let mut momentum: Vec<f64> = self
            .mass
            .mass()
            .iter()
            .map(|&w| {
                let sign = if self.rng.random::<f64>() > 0.5 { 1.0 } else { -1.0 };
                let e: f64 = self.rng.sample(Exp1);
                sign * e * w.sqrt()
            })
            .collect();
        apply_mask(self.mask.as_ref(), &mut momentum);
        momentum
    }

    /// Total travel time for the next trajectory.
    pub fn draw_travel_time(&mut self) -> f64 {
        self.travel_time.draw(&mut self.rng)
    }

    /// Full transition: fresh momentum and travel time, then integrate. `position` is
    /// overwritten with the proposal.
    pub fn operate(&mut self, position: &mut [f64]) -> Result<TrajectorySummary> {
        let mut momentum = self.draw_momentum();
        let travel_time = self.draw_travel_time();
        self.integrate(position, &mut momentum, travel_time)
    }

    /// Integrate forward for `travel_time` from the given position and momentum, both
    /// updated in place.
    pub fn integrate(
        &mut self,
        position: &mut [f64],
        momentum: &mut [f64],
        travel_time: f64,
    ) -> Result<TrajectorySummary> {
        check_len("position", self.dim, position.len())?;
        check_len("momentum", self.dim, momentum.len())?;

        let mut velocity = velocity_from_momentum(momentum, self.mass.mass());
        apply_mask(self.mask.as_ref(), &mut velocity);

        let mut gradient = self.gradient.gradient_log_density(position)?;
        check_len("gradient", self.dim, gradient.len())?;
        apply_mask(self.mask.as_ref(), &mut gradient);

        let mut action = self.product.product_with_precision(&velocity)?;
        check_len("action", self.dim, action.len())?;
        apply_mask(self.mask.as_ref(), &mut action);

        let mut report = if self.record_trajectory {
            Some(TrajectoryReport::new(travel_time, position))
        } else {
            None
        };

        let mut state = TrajectoryState::new(position, momentum, velocity, gradient, action)?;
        let mut bounce = BounceState::start(travel_time)?;
        let mut summary = TrajectorySummary {
            travel_time,
            ..TrajectorySummary::default()
        };

        debug!(
            dim = self.dim,
            travel_time,
            scheduler = self.scheduler.name(),
            "zig-zag trajectory start"
        );

        while bounce.is_time_remaining() {
            let next = self.scheduler.next_event(&state, &bounce)?;
            bounce = self.do_bounce(&mut state, &bounce, next)?;

            match bounce.kind {
                BounceType::Boundary => summary.boundary_events += 1,
                BounceType::Gradient => summary.gradient_events += 1,
                BounceType::None => {}
            }
            if let Some(report) = report.as_mut() {
                report.record(bounce, &state);
            }
        }

        debug!(
            boundary_events = summary.boundary_events,
            gradient_events = summary.gradient_events,
            "zig-zag trajectory end"
        );

        self.last_report = report;
        Ok(summary)
    }

    /// Advance to the next event (or to the end of the travel time) and apply it.
    fn do_bounce(
        &self,
        state: &mut TrajectoryState<'_>,
        current: &BounceState,
        next: Option<MinimumTravelInformation>,
    ) -> Result<BounceState> {
        let remaining_time = current.remaining_time;

        // An event at exactly the remaining time ends the trajectory unapplied.
        let event = match next {
            Some(event) if event.time_f64() < remaining_time => event,
            _ => {
                state.advance_position_momentum(remaining_time);
                return Ok(BounceState::finished());
            }
        };

        let event_time = event.time_f64();
        let index = event.index;

        state.advance_position_momentum(event_time);
        if event.kind == BounceType::Boundary {
            state.reflect_at_boundary(index);
        } else {
            state.reflect_at_gradient(index);
        }
        state.advance_gradient(event_time);
        self.action_update
            .update_action(&mut state.action, &state.velocity, index)?;

        let after = BounceState::after(event.kind, index, remaining_time - event_time);
        trace!(
            kind = %event.kind,
            index,
            time = event_time,
            remaining = after.remaining_time,
            "bounce"
        );
        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mass::DiagonalMass;
    use crate::core::provider::DensePrecisionTarget;

    fn operator(dim: usize, config: &ZigZagConfig) -> Result<ParticleOperator> {
        let target = Arc::new(DensePrecisionTarget::identity(dim)?);
        let mass = Arc::new(DiagonalMass::unit(dim)?);
        ParticleOperator::new(Collaborators::from_target(target, mass, None), config)
    }

    #[test]
    fn momentum_draw_is_reproducible() -> Result<()> {
        let config = ZigZagConfig::default().with_seed(42);
        let mut a = operator(5, &config)?;
        let mut b = operator(5, &config)?;
        assert_eq!(a.draw_momentum(), b.draw_momentum());
        Ok(())
    }

    #[test]
    fn momentum_draw_respects_mass_scale() -> Result<()> {
        let target = Arc::new(DensePrecisionTarget::identity(2)?);
        let mass = Arc::new(DiagonalMass::new(vec![1.0, 1e6])?);
        let mut op = ParticleOperator::new(
            Collaborators::from_target(target, mass, None),
            &ZigZagConfig::default().with_seed(3),
        )?;
        let n = 4000;
        let (mut s0, mut s1) = (0.0, 0.0);
        for _ in 0..n {
            let m = op.draw_momentum();
            s0 += m[0].abs();
            s1 += m[1].abs();
        }
        let ratio = (s1 / n as f64) / (s0 / n as f64);
        assert!((ratio - 1000.0).abs() < 100.0, "ratio {ratio}");
        Ok(())
    }

    #[test]
    fn dimension_mismatch_between_collaborators() -> Result<()> {
        let target = Arc::new(DensePrecisionTarget::identity(3)?);
        let mass = Arc::new(DiagonalMass::unit(2)?);
        let err = ParticleOperator::new(
            Collaborators::from_target(target, mass, None),
            &ZigZagConfig::default(),
        )
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
        assert!(err.contains("dimension mismatch"), "{err}");
        Ok(())
    }

    #[test]
    fn wrong_position_length_rejected() -> Result<()> {
        let mut op = operator(3, &ZigZagConfig::default().with_seed(1))?;
        let mut p = vec![1.0; 2];
        assert!(matches!(
            op.operate(&mut p),
            Err(Error::DimensionMismatch { what: "position", .. })
        ));
        Ok(())
    }

    #[test]
    fn thread_count_selects_scheduler() -> Result<()> {
        assert_eq!(operator(4, &ZigZagConfig::default())?.scheduler_name(), "serial");
        assert_eq!(
            operator(4, &ZigZagConfig::default().with_threads(1))?.scheduler_name(),
            "serial"
        );
        assert_eq!(
            operator(4, &ZigZagConfig::default().with_threads(3))?.scheduler_name(),
            "parallel"
        );
        Ok(())
    }

    #[test]
    fn action_update_kind_selects_strategy() -> Result<()> {
        assert_eq!(
            operator(2, &ZigZagConfig::default())?.action_update_name(),
            "rank-one-column"
        );
        let config = ZigZagConfig::default().with_action_update(ActionUpdateKind::FullProduct);
        assert_eq!(operator(2, &config)?.action_update_name(), "full-product");
        Ok(())
    }

    #[test]
    fn zero_travel_time_leaves_position() -> Result<()> {
        let mut op = operator(2, &ZigZagConfig::default())?;
        let mut p = vec![0.5, 1.5];
        let mut m = vec![1.0, -1.0];
        let summary = op.integrate(&mut p, &mut m, 0.0)?;
        assert_eq!(summary.events(), 0);
        assert_eq!(p, vec![0.5, 1.5]);
        Ok(())
    }
}
