use crate::config::ZigZagConfig;
use crate::core::operator::{Collaborators, ParticleOperator, TrajectorySummary};
use crate::core::report::TrajectoryReport;
use crate::error::{Error, Result};

/// Integration direction for a reversible step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl TryFrom<i32> for Direction {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(Error::InvalidParam(format!(
                "direction must be 1 or -1, got {other}"
            ))),
        }
    }
}

/// Time-symmetric position update for use inside an outer reversible integrator.
///
/// Backward steps negate the momentum, run the forward dynamics, and negate it again;
/// the dynamics themselves never see the direction.
pub struct ReversibleParticleOperator {
    engine: ParticleOperator,
}

impl ReversibleParticleOperator {
    pub fn new(collaborators: Collaborators, config: &ZigZagConfig) -> Result<Self> {
        Ok(Self {
            engine: ParticleOperator::new(collaborators, config)?,
        })
    }

    pub fn from_engine(engine: ParticleOperator) -> Self {
        Self { engine }
    }

    /// Move `position` and `momentum` along the Zig-Zag dynamics for `time` in `direction`.
    ///
    /// Running `Forward` then `Backward` for the same `time` restores the starting pair
    /// up to floating-point error.
    pub fn reversible_position_update(
        &mut self,
        position: &mut [f64],
        momentum: &mut [f64],
        direction: Direction,
        time: f64,
    ) -> Result<TrajectorySummary> {
        match direction {
            Direction::Forward => self.engine.integrate(position, momentum, time),
            Direction::Backward => {
                negate(momentum);
                let result = self.engine.integrate(position, momentum, time);
                negate(momentum);
                result
            }
        }
    }

    /// Fresh momentum, drawn exactly as at the start of a full transition.
    pub fn draw_momentum(&mut self) -> Vec<f64> {
        self.engine.draw_momentum()
    }

    /// Non-reversible full transition (momentum and travel time drawn internally).
    pub fn operate(&mut self, position: &mut [f64]) -> Result<TrajectorySummary> {
        self.engine.operate(position)
    }

    pub fn last_report(&self) -> Option<&TrajectoryReport> {
        self.engine.last_report()
    }

    pub fn engine(&self) -> &ParticleOperator {
        &self.engine
    }
}

fn negate(values: &mut [f64]) {
    for x in values.iter_mut() {
        *x = -*x;
    }
}
