use crate::error::{Error, Result};

/// Full dynamic state of one trajectory integration.
///
/// `position` and `momentum` are borrowed from the caller and mutated in place; the
/// derived arrays live only for the duration of one integration call.
///
/// Fields:
/// - `position`: current point in parameter space
/// - `momentum`: evolves quadratically between events, reflected or zeroed at events
/// - `velocity`: `sign(momentum) / sqrt(mass)` at the start, one coordinate flipped per event
/// - `gradient`: log-density gradient, updated as `gradient - t * action`
/// - `action`: precision · velocity, refreshed by rank-1 updates after each event
#[derive(Debug)]
pub struct TrajectoryState<'a> {
    pub position: &'a mut [f64],
    pub momentum: &'a mut [f64],
    pub velocity: Vec<f64>,
    pub gradient: Vec<f64>,
    pub action: Vec<f64>,
}

impl<'a> TrajectoryState<'a> {
    /// Assemble the state after checking that every array has the position's length
    /// and that the oracle-supplied arrays are finite.
    pub fn new(
        position: &'a mut [f64],
        momentum: &'a mut [f64],
        velocity: Vec<f64>,
        gradient: Vec<f64>,
        action: Vec<f64>,
    ) -> Result<Self> {
        let dim = position.len();
        check_len("momentum", dim, momentum.len())?;
        check_len("velocity", dim, velocity.len())?;
        check_len("gradient", dim, gradient.len())?;
        check_len("action", dim, action.len())?;
        check_finite("position", position)?;
        check_finite("momentum", momentum)?;
        check_finite("gradient", &gradient)?;
        check_finite("action", &action)?;
        Ok(Self {
            position,
            momentum,
            velocity,
            gradient,
            action,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.position.len()
    }

    /// Advance position and momentum by `time` along the current segment.
    ///
    /// `x += t v`, `m += t g - t^2/2 a`. Gradient and action are left untouched.
    ///
    /// No coordinate changes sign inside a segment, so a round-off crossing of zero is
    /// clamped to the signed zero of the side it started on.
    pub fn advance_position_momentum(&mut self, time: f64) {
        let half_time_squared = time * time / 2.0;
        for (((p, m), (&v, &g)), &a) in self
            .position
            .iter_mut()
            .zip(self.momentum.iter_mut())
            .zip(self.velocity.iter().zip(&self.gradient))
            .zip(&self.action)
        {
            let next = *p + time * v;
            *p = if next.is_sign_negative() != p.is_sign_negative() {
                0.0f64.copysign(*p)
            } else {
                next
            };
            *m += time * g - half_time_squared * a;
        }
    }

    /// Evolve the gradient by `time` using the action of the segment just travelled.
    pub fn advance_gradient(&mut self, time: f64) {
        for (g, &a) in self.gradient.iter_mut().zip(&self.action) {
            *g -= time * a;
        }
    }

    /// Boundary reflection on `index`: momentum sign flipped, velocity sign flipped,
    /// position pinned to the zero whose sign matches the new velocity.
    pub fn reflect_at_boundary(&mut self, index: usize) {
        self.momentum[index] = -self.momentum[index];
        self.velocity[index] = -self.velocity[index];
        self.position[index] = 0.0f64.copysign(self.velocity[index]);
    }

    /// Gradient bounce on `index`: momentum zeroed, velocity sign flipped.
    pub fn reflect_at_gradient(&mut self, index: usize) {
        self.momentum[index] = 0.0;
        self.velocity[index] = -self.velocity[index];
    }
}

/// `sign(momentum[i]) / sqrt(mass[i])`; a zero momentum gives a zero velocity.
pub fn velocity_from_momentum(momentum: &[f64], mass: &[f64]) -> Vec<f64> {
    momentum
        .iter()
        .zip(mass)
        .map(|(&m, &w)| sign(m) / w.sqrt())
        .collect()
}

#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|x| !x.is_finite()) {
        Some(i) => Err(Error::NonFinite(format!(
            "{what}[{i}] = {}",
            values[i]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_uses_sign_and_mass() {
        let v = velocity_from_momentum(&[2.5, -0.1, 0.0], &[4.0, 1.0, 9.0]);
        assert_eq!(v, vec![0.5, -1.0, 0.0]);
    }

    #[test]
    fn new_state_rejects_short_gradient() {
        let mut p = [1.0, 2.0];
        let mut m = [1.0, -1.0];
        let err = TrajectoryState::new(&mut p, &mut m, vec![1.0, -1.0], vec![0.0], vec![0.0, 0.0])
            .unwrap_err();
        assert!(err.to_string().contains("gradient"));
    }

    #[test]
    fn new_state_rejects_nan_action() {
        let mut p = [1.0];
        let mut m = [1.0];
        let err = TrajectoryState::new(&mut p, &mut m, vec![1.0], vec![0.0], vec![f64::NAN])
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite(_)));
    }

    #[test]
    fn closed_form_segment_update() -> Result<()> {
        let mut p = [1.0, 2.0];
        let mut m = [0.5, -0.5];
        let mut s = TrajectoryState::new(
            &mut p,
            &mut m,
            vec![1.0, -1.0],
            vec![-1.0, 0.5],
            vec![2.0, -1.0],
        )?;
        s.advance_position_momentum(0.5);
        s.advance_gradient(0.5);
        // m0 + t g - t^2/2 a
        assert!((s.momentum[0] - (0.5 - 0.5 - 0.25)).abs() < 1e-15);
        assert!((s.momentum[1] - (-0.5 + 0.25 + 0.125)).abs() < 1e-15);
        assert_eq!(s.position, &[1.5, 1.5]);
        assert_eq!(s.gradient, vec![-2.0, 1.0]);
        Ok(())
    }

    #[test]
    fn reflections() -> Result<()> {
        let mut p = [1e-17, 3.0];
        let mut m = [-0.3, 0.2];
        let mut s = TrajectoryState::new(&mut p, &mut m, vec![-1.0, 1.0], vec![0.0; 2], vec![0.0; 2])?;
        s.reflect_at_boundary(0);
        assert_eq!(s.position[0], 0.0);
        assert!(s.position[0].is_sign_positive());
        assert_eq!(s.momentum[0], 0.3);
        assert_eq!(s.velocity[0], 1.0);
        s.reflect_at_gradient(1);
        assert_eq!(s.momentum[1], 0.0);
        assert_eq!(s.velocity[1], -1.0);
        Ok(())
    }

    #[test]
    fn boundary_pin_on_negative_side_keeps_negative_zero() -> Result<()> {
        let mut p = [-1e-17];
        let mut m = [0.4];
        let mut s = TrajectoryState::new(&mut p, &mut m, vec![1.0], vec![0.0], vec![0.0])?;
        s.reflect_at_boundary(0);
        assert_eq!(s.velocity[0], -1.0);
        assert!(s.position[0] == 0.0 && s.position[0].is_sign_negative());
        Ok(())
    }

    #[test]
    fn segment_never_crosses_zero() -> Result<()> {
        // 0.3 - 3 * 0.1 rounds to a tiny negative number.
        let mut p = [0.3, -0.3, -0.0];
        let mut m = [-1.0, 1.0, 0.0];
        let mut s = TrajectoryState::new(
            &mut p,
            &mut m,
            vec![-0.1, 0.1, 0.0],
            vec![0.0; 3],
            vec![0.0; 3],
        )?;
        s.advance_position_momentum(3.0);
        assert!(s.position[0] == 0.0 && s.position[0].is_sign_positive());
        assert!(s.position[1] == 0.0 && s.position[1].is_sign_negative());
        assert!(s.position[2].is_sign_negative(), "masked zero keeps its side");
        Ok(())
    }
}
