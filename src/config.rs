//! Operator configuration.

use crate::error::{Error, Result};
use rand::Rng;
use rand_distr::Exp1;

/// How the total travel time of one trajectory is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelTimePolicy {
    /// Always the same duration.
    Fixed(f64),
    /// Exponential with the given mean.
    Exponential { mean: f64 },
    /// `duration * (1 + width * (u - 1/2))` with `u ~ U(0, 1)`; `width` in `[0, 2)`.
    Jittered { duration: f64, width: f64 },
}

impl Default for TravelTimePolicy {
    fn default() -> Self {
        TravelTimePolicy::Exponential { mean: 1.0 }
    }
}

impl TravelTimePolicy {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, x: f64| -> Result<()> {
            if !x.is_finite() || x <= 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and > 0, got {x}"
                )));
            }
            Ok(())
        };
        match *self {
            TravelTimePolicy::Fixed(t) => positive("travel time", t),
            TravelTimePolicy::Exponential { mean } => positive("travel time mean", mean),
            TravelTimePolicy::Jittered { duration, width } => {
                positive("travel time duration", duration)?;
                if !(0.0..2.0).contains(&width) {
                    return Err(Error::InvalidParam(format!(
                        "travel time jitter width must be in [0, 2), got {width}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Draw one total travel time.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            TravelTimePolicy::Fixed(t) => t,
            TravelTimePolicy::Exponential { mean } => {
                let e: f64 = rng.sample(Exp1);
                mean * e
            }
            TravelTimePolicy::Jittered { duration, width } => {
                let u: f64 = rng.random();
                duration * (1.0 + width * (u - 0.5))
            }
        }
    }
}

/// Which action-update strategy the engine uses after each bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionUpdateKind {
    /// Rank-1 correction from one precision column.
    #[default]
    RankOneColumn,
    /// Full precision-vector product every event. A debugging aid for cross-checking the
    /// rank-1 path; it costs a full matrix-vector product per bounce and is never
    /// selected unless asked for.
    FullProduct,
}

/// Construction-time options for a particle operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ZigZagConfig {
    pub travel_time: TravelTimePolicy,
    /// `None` or `Some(1)`: serial event search. `Some(n > 1)`: pool of `n` workers.
    pub threads: Option<usize>,
    /// RNG seed for reproducibility; `None` for nondeterministic.
    pub seed: Option<u64>,
    /// Keep a per-event [`TrajectoryReport`](crate::core::TrajectoryReport) of the last trajectory.
    pub record_trajectory: bool,
    pub action_update: ActionUpdateKind,
}

impl Default for ZigZagConfig {
    fn default() -> Self {
        Self {
            travel_time: TravelTimePolicy::default(),
            threads: None,
            seed: None,
            record_trajectory: false,
            action_update: ActionUpdateKind::default(),
        }
    }
}

impl ZigZagConfig {
    pub fn validate(&self) -> Result<()> {
        self.travel_time.validate()?;
        if self.threads == Some(0) {
            return Err(Error::InvalidParam("threads must be > 0".into()));
        }
        Ok(())
    }

    /// Builder-style setters.
    pub fn with_travel_time(mut self, travel_time: TravelTimePolicy) -> Self {
        self.travel_time = travel_time;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_recording(mut self, record: bool) -> Self {
        self.record_trajectory = record;
        self
    }

    pub fn with_action_update(mut self, kind: ActionUpdateKind) -> Self {
        self.action_update = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn default_is_valid() -> Result<()> {
        ZigZagConfig::default().validate()
    }

    #[test]
    fn zero_threads_rejected() {
        let err = ZigZagConfig::default().with_threads(0).validate().unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn non_positive_travel_times_rejected() {
        assert!(TravelTimePolicy::Fixed(0.0).validate().is_err());
        assert!(TravelTimePolicy::Exponential { mean: f64::NAN }.validate().is_err());
        assert!(TravelTimePolicy::Jittered {
            duration: 1.0,
            width: 2.0
        }
        .validate()
        .is_err());
    }

    #[test]
    fn draws_are_positive_and_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let jitter = TravelTimePolicy::Jittered {
            duration: 2.0,
            width: 0.5,
        };
        let exp = TravelTimePolicy::Exponential { mean: 0.5 };
        for _ in 0..1000 {
            let t = jitter.draw(&mut rng);
            assert!((1.5..=2.5).contains(&t), "jittered draw {t}");
            assert!(exp.draw(&mut rng) >= 0.0);
        }
        assert_eq!(TravelTimePolicy::Fixed(2.0).draw(&mut rng), 2.0);
    }

    #[test]
    fn exponential_mean_is_roughly_right() {
        let mut rng = StdRng::seed_from_u64(5);
        let policy = TravelTimePolicy::Exponential { mean: 3.0 };
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| policy.draw(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 3.0).abs() < 0.15, "sample mean {mean}");
    }
}
