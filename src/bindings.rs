use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::sync::Arc;

use crate::config::{TravelTimePolicy, ZigZagConfig};
use crate::core::{
    Collaborators, DensePrecisionTarget, DiagonalMass, Direction, Mask,
    ReversibleParticleOperator,
};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// ZigZagSampler: Python-facing wrapper around the Zig-Zag operator for a truncated
/// Gaussian target with dense precision.
///
/// API:
/// - __new__(precision, mean=None, mass=None, mask=None, travel_time=1.0,
///           random_time=True, threads=None, seed=None, record=False)
/// - operate(position) -> np.ndarray
/// - reversible_update(position, momentum, direction, time) -> (np.ndarray, np.ndarray)
/// - draw_momentum() -> np.ndarray
/// - trajectory_report() -> str | None
#[pyclass]
pub struct ZigZagSampler {
    op: ReversibleParticleOperator,
    dim: usize,
}

#[pymethods]
impl ZigZagSampler {
    /// Build a sampler.
    ///
    /// Parameters
    /// - precision: square symmetric float64 array
    /// - mean: optional mean vector (default zero)
    /// - mass: optional positive per-coordinate mass (default ones)
    /// - mask: optional list of coordinate indices held fixed
    /// - travel_time: trajectory length, or its mean when random_time=True
    /// - random_time: draw an exponential travel time per trajectory
    /// - threads: worker count for the event search (None for serial)
    /// - seed: RNG seed (int) for reproducibility; None for nondeterministic
    /// - record: keep a per-event report of the last trajectory
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (precision, mean=None, mass=None, mask=None, travel_time=1.0, random_time=true, threads=None, seed=None, record=false))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        precision: PyReadonlyArray2<'_, f64>,
        mean: Option<Vec<f64>>,
        mass: Option<Vec<f64>>,
        mask: Option<Vec<usize>>,
        travel_time: f64,
        random_time: bool,
        threads: Option<usize>,
        seed: Option<u64>,
        record: bool,
    ) -> PyResult<Self> {
        let arr = precision.as_array();
        let (rows, cols) = arr.dim();
        if rows != cols {
            return Err(py_err(format!(
                "precision must be square, got shape ({rows}, {cols})"
            )));
        }
        let flat: Vec<f64> = arr.iter().copied().collect();
        let target = Arc::new(DensePrecisionTarget::new(flat, rows, mean).map_err(py_err)?);

        let mass = match mass {
            Some(m) => DiagonalMass::new(m),
            None => DiagonalMass::unit(rows),
        }
        .map_err(py_err)?;
        let mask = mask
            .map(|excluded| Mask::excluding(rows, &excluded))
            .transpose()
            .map_err(py_err)?;

        let config = ZigZagConfig {
            travel_time: if random_time {
                TravelTimePolicy::Exponential { mean: travel_time }
            } else {
                TravelTimePolicy::Fixed(travel_time)
            },
            threads,
            seed,
            record_trajectory: record,
            ..ZigZagConfig::default()
        };
        let collaborators = Collaborators::from_target(target, Arc::new(mass), mask);
        let op = ReversibleParticleOperator::new(collaborators, &config).map_err(py_err)?;
        Ok(Self { op, dim: rows })
    }

    /// Dimension of the sampled space.
    #[getter]
    fn dim(&self) -> usize {
        self.dim
    }

    /// Run one full transition from `position` and return the proposal (releases the GIL).
    fn operate<'py>(
        &mut self,
        py: Python<'py>,
        position: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Py<PyArray1<f64>>> {
        let mut p = position.as_array().to_vec();
        py.detach(|| self.op.operate(&mut p)).map_err(py_err)?;
        Ok(p.into_pyarray(py).unbind())
    }

    /// Reversible step; `direction` is 1 or -1. Returns (position, momentum).
    fn reversible_update<'py>(
        &mut self,
        py: Python<'py>,
        position: PyReadonlyArray1<'py, f64>,
        momentum: PyReadonlyArray1<'py, f64>,
        direction: i32,
        time: f64,
    ) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        let direction = Direction::try_from(direction).map_err(py_err)?;
        let mut p = position.as_array().to_vec();
        let mut m = momentum.as_array().to_vec();
        py.detach(|| {
            self.op
                .reversible_position_update(&mut p, &mut m, direction, time)
        })
        .map_err(py_err)?;
        Ok((p.into_pyarray(py).unbind(), m.into_pyarray(py).unbind()))
    }

    /// Draw a fresh momentum vector.
    fn draw_momentum(&mut self, py: Python<'_>) -> Py<PyArray1<f64>> {
        self.op.draw_momentum().into_pyarray(py).unbind()
    }

    /// Human-readable report of the last trajectory, if recording is enabled.
    fn trajectory_report(&self) -> Option<String> {
        self.op.last_report().map(|r| r.to_string())
    }
}

/// The zigzag Python module entry point.
#[pymodule]
fn zigzag(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ZigZagSampler>()?;
    Ok(())
}
