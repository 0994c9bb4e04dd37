//! Zig-Zag piecewise-deterministic MCMC transition operator.
//!
//! A particle moves at constant speed along every coordinate and flips one coordinate's
//! velocity at a time, either when that coordinate reaches the boundary at zero or when
//! its momentum is exhausted by a quadratic (precision-matrix) energy. See
//! [`core::ParticleOperator`] for the full transition and
//! [`core::ReversibleParticleOperator`] for the time-symmetric step.

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod bindings;

pub use crate::config::{ActionUpdateKind, TravelTimePolicy, ZigZagConfig};
pub use crate::core::{ParticleOperator, ReversibleParticleOperator};
pub use crate::error::{Error, Result};
