use crate::core::event::{BounceState, BounceType};
use crate::core::state::TrajectoryState;
use std::fmt;

/// Snapshot taken right after an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub bounce: BounceState,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub momentum: Vec<f64>,
}

/// Human-readable record of one trajectory. Debugging aid only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryReport {
    pub travel_time: f64,
    pub initial_position: Vec<f64>,
    pub entries: Vec<ReportEntry>,
}

impl TrajectoryReport {
    pub fn new(travel_time: f64, initial_position: &[f64]) -> Self {
        Self {
            travel_time,
            initial_position: initial_position.to_vec(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, bounce: BounceState, state: &TrajectoryState<'_>) {
        self.entries.push(ReportEntry {
            bounce,
            position: state.position.to_vec(),
            velocity: state.velocity.clone(),
            momentum: state.momentum.to_vec(),
        });
    }

    /// Number of bounce events (the terminal entry excluded).
    pub fn bounce_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.bounce.kind != BounceType::None)
            .count()
    }
}

impl fmt::Display for TrajectoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "travel time: {}", self.travel_time)?;
        writeln!(f, "init position: {:?}", self.initial_position)?;
        for (n, e) in self.entries.iter().enumerate() {
            writeln!(f, "event {n}: {}", e.bounce)?;
            writeln!(f, "  position: {:?}", e.position)?;
            writeln!(f, "  velocity: {:?}", e.velocity)?;
            writeln!(f, "  momentum: {:?}", e.momentum)?;
        }
        Ok(())
    }
}
