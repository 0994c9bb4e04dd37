//! Zig-Zag sampler core.
//!
//! Leaves first: trajectory `state`, `event` bookkeeping, the `scheduler` that finds the
//! next bounce, `update` strategies for the action vector, then the `operator` engine and
//! its `reversible` wrapper.

pub mod event;
pub mod mask;
pub mod mass;
pub mod operator;
pub mod provider;
pub mod report;
pub mod reversible;
pub mod scheduler;
pub mod state;
pub mod update;

pub use event::{BounceState, BounceType, MinimumTravelInformation};
pub use mask::Mask;
pub use mass::{DiagonalMass, MassModel};
pub use operator::{Collaborators, ParticleOperator, TrajectorySummary};
pub use provider::{
    DensePrecisionTarget, GradientProvider, PrecisionColumnProvider, PrecisionProductProvider,
};
pub use report::TrajectoryReport;
pub use reversible::{Direction, ReversibleParticleOperator};
pub use scheduler::{EventScheduler, ParallelScheduler, SerialScheduler};
pub use state::TrajectoryState;
pub use update::{ActionUpdate, FullProductUpdate, RankOneColumnUpdate};
