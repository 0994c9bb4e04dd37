use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::fmt;

/// Kind of the most recent event on a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BounceType {
    /// No event yet, or the trajectory ran out of time.
    None,
    /// A coordinate reached the domain edge at zero.
    Boundary,
    /// A coordinate's momentum reached zero under the gradient dynamics.
    Gradient,
}

impl fmt::Display for BounceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BounceType::None => "NONE",
            BounceType::Boundary => "BOUNDARY",
            BounceType::Gradient => "GRADIENT",
        };
        f.write_str(s)
    }
}

/// Discrete state of a trajectory between events.
///
/// - `kind`: type of the last event.
/// - `index`: coordinate of the last event, `None` before the first event and at termination.
/// - `remaining_time`: travel time left, never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceState {
    pub kind: BounceType,
    pub index: Option<usize>,
    pub remaining_time: f64,
}

impl BounceState {
    /// Initial state for a trajectory of total length `travel_time`.
    pub fn start(travel_time: f64) -> Result<Self> {
        if !travel_time.is_finite() || travel_time < 0.0 {
            return Err(Error::InvalidParam(format!(
                "travel time must be finite and >= 0, got {travel_time}"
            )));
        }
        Ok(Self {
            kind: BounceType::None,
            index: None,
            remaining_time: travel_time,
        })
    }

    /// Terminal state: the remaining time was consumed without another event.
    pub fn finished() -> Self {
        Self {
            kind: BounceType::None,
            index: None,
            remaining_time: 0.0,
        }
    }

    /// State after an event of `kind` on coordinate `index`.
    pub fn after(kind: BounceType, index: usize, remaining_time: f64) -> Self {
        Self {
            kind,
            index: Some(index),
            remaining_time,
        }
    }

    #[inline]
    pub fn is_time_remaining(&self) -> bool {
        self.remaining_time > 0.0
    }

    /// Coordinate that must be skipped by the next boundary search: the one that just
    /// reflected off the boundary and is now moving away from it.
    #[inline]
    pub fn excluded_boundary_index(&self) -> Option<usize> {
        match self.kind {
            BounceType::Boundary => self.index,
            _ => None,
        }
    }
}

impl fmt::Display for BounceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(
                f,
                "remaining time: {}, last bounce: {} in dim {}",
                self.remaining_time, self.kind, i
            ),
            None => write!(
                f,
                "remaining time: {}, last bounce: {}",
                self.remaining_time, self.kind
            ),
        }
    }
}

/// Earliest candidate event found by a search.
///
/// `time` is the least positive root of the event equation for coordinate `index`.
/// Searches return `Option<MinimumTravelInformation>`; `None` is the "+inf, no event in
/// finite time" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumTravelInformation {
    pub time: NotNan<f64>,
    pub index: usize,
    pub kind: BounceType,
}

impl MinimumTravelInformation {
    /// Candidate event. An infinite time is "no event"; a NaN time means the state
    /// has gone non-finite and is reported, never skipped.
    pub fn candidate(time: f64, index: usize, kind: BounceType) -> Result<Option<Self>> {
        if time.is_infinite() {
            return Ok(None);
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::NonFinite(format!("{kind} event time for dim {index} is NaN")))?;
        Ok(Some(Self { time, index, kind }))
    }

    /// Returns the raw f64 event time.
    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// Strictly earlier than `other`.
    #[inline]
    pub fn is_earlier_than(&self, other: &Self) -> bool {
        self.time < other.time
    }
}

/// Keep the earlier of `incumbent` and `challenger`. Equal times keep the incumbent, so
/// the candidate examined first wins a tie.
#[inline]
pub fn earliest(
    incumbent: Option<MinimumTravelInformation>,
    challenger: Option<MinimumTravelInformation>,
) -> Option<MinimumTravelInformation> {
    match (incumbent, challenger) {
        (Some(a), Some(b)) if b.is_earlier_than(&a) => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

/// Event time of a search result, `+inf` when nothing was found.
#[inline]
pub fn time_or_infinity(info: &Option<MinimumTravelInformation>) -> f64 {
    info.map_or(f64::INFINITY, |m| m.time_f64())
}

impl fmt::Display for MinimumTravelInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at time {} in dim {}", self.kind, self.time, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_rejects_negative_time() {
        let err = BounceState::start(-1.0).unwrap_err();
        assert!(err.to_string().contains("travel time"));
    }

    #[test]
    fn start_rejects_nan_time() {
        assert!(BounceState::start(f64::NAN).is_err());
    }

    #[test]
    fn only_boundary_events_exclude_their_index() {
        let b = BounceState::after(BounceType::Boundary, 3, 1.0);
        let g = BounceState::after(BounceType::Gradient, 3, 1.0);
        assert_eq!(b.excluded_boundary_index(), Some(3));
        assert_eq!(g.excluded_boundary_index(), None);
        assert_eq!(BounceState::finished().excluded_boundary_index(), None);
    }

    #[test]
    fn infinite_candidate_is_no_event() -> Result<()> {
        assert!(MinimumTravelInformation::candidate(f64::INFINITY, 0, BounceType::Gradient)?
            .is_none());
        Ok(())
    }

    #[test]
    fn nan_candidate_is_an_error() {
        let err = MinimumTravelInformation::candidate(f64::NAN, 5, BounceType::Gradient)
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite(_)));
        assert!(err.to_string().contains("dim 5"), "{err}");
    }

    #[test]
    fn tie_keeps_incumbent() {
        let a = MinimumTravelInformation::candidate(1.0, 0, BounceType::Boundary).unwrap();
        let b = MinimumTravelInformation::candidate(1.0, 1, BounceType::Gradient).unwrap();
        let m = earliest(a, b).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.kind, BounceType::Boundary);
    }

    #[test]
    fn nothing_loses_to_any_candidate() {
        let c = MinimumTravelInformation::candidate(1e300, 7, BounceType::Gradient).unwrap();
        assert_eq!(earliest(None, c).map(|m| m.index), Some(7));
        assert_eq!(earliest(c, None).map(|m| m.index), Some(7));
        assert_eq!(time_or_infinity(&None), f64::INFINITY);
        assert_eq!(time_or_infinity(&c), 1e300);
    }

    #[test]
    fn strictly_earlier_challenger_replaces_incumbent() {
        let a = MinimumTravelInformation::candidate(2.0, 0, BounceType::Boundary).unwrap();
        let b = MinimumTravelInformation::candidate(0.5, 4, BounceType::Gradient).unwrap();
        let m = earliest(a, b).unwrap();
        assert_eq!(m.index, 4);
        assert_eq!(m.time_f64(), 0.5);
    }
}
