//! Python bindings (enabled with the `python` feature).

use std::collections::HashMap;

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::config::SchedulingConfig;
use crate::error::ScheduleError;
use crate::project::Project;

fn to_py_err(err: ScheduleError) -> PyErr {
    match err {
        ScheduleError::NotFound { .. } => PyKeyError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// One scheduling session.
///
/// Methods run with the GIL held, which serializes calls on one instance.
/// A call that re-enters the object while a `&mut self` method is running
/// fails with `RuntimeError: Already borrowed` instead of waiting.
#[pyclass(name = "Project")]
pub struct PyProject {
    inner: Project,
}

#[pymethods]
impl PyProject {
    #[new]
    #[pyo3(signature = (traversal="topological", open_ends="reject", removal="cascade", cdf="standard", verbosity=0))]
    fn new(
        traversal: &str,
        open_ends: &str,
        removal: &str,
        cdf: &str,
        verbosity: u8,
    ) -> PyResult<Self> {
        let config = SchedulingConfig {
            traversal: traversal.parse().map_err(to_py_err)?,
            open_ends: open_ends.parse().map_err(to_py_err)?,
            removal: removal.parse().map_err(to_py_err)?,
            cdf: cdf.parse().map_err(to_py_err)?,
            verbosity,
        };
        Ok(Self {
            inner: Project::new(config),
        })
    }

    /// Add an activity; returns warnings for dependency names that did not resolve.
    #[pyo3(signature = (name, duration, dependencies=Vec::new()))]
    fn add_activity(
        &mut self,
        name: &str,
        duration: i64,
        dependencies: Vec<String>,
    ) -> PyResult<Vec<String>> {
        let added = self
            .inner
            .add_activity(name, duration, dependencies)
            .map_err(to_py_err)?;
        Ok(added.warnings.iter().map(ToString::to_string).collect())
    }

    fn remove_activity(&mut self, name: &str) -> PyResult<Vec<String>> {
        self.inner.remove_activity(name).map_err(to_py_err)
    }

    /// Returns (critical path from start to end, cpm_time).
    fn compute_cpm(&mut self) -> PyResult<(Vec<String>, i64)> {
        let result = self.inner.compute_cpm().map_err(to_py_err)?;
        let path = result.start_to_end().map(str::to_string).collect();
        Ok((path, result.cpm_time))
    }

    /// Returns (expected, variance) of the new task.
    fn add_task(
        &mut self,
        name: &str,
        optimistic: f64,
        most_likely: f64,
        pessimistic: f64,
    ) -> PyResult<(f64, f64)> {
        let task = self
            .inner
            .add_task(name, optimistic, most_likely, pessimistic)
            .map_err(to_py_err)?;
        Ok((task.expected(), task.variance()))
    }

    fn remove_task(&mut self, name: &str) -> PyResult<()> {
        self.inner.remove_task(name).map(|_| ()).map_err(to_py_err)
    }

    /// Returns (project_time, project_variance, project_std_dev, {name: probability}).
    fn compute_pert(&self) -> PyResult<(f64, f64, f64, HashMap<String, f64>)> {
        let report = self.inner.compute_pert().map_err(to_py_err)?;
        let probabilities = report
            .per_task_probability
            .into_iter()
            .map(|p| (p.name, p.probability))
            .collect();
        Ok((
            report.estimate.project_time,
            report.estimate.project_variance,
            report.estimate.project_std_dev,
            probabilities,
        ))
    }

    fn __repr__(&self) -> String {
        format!(
            "Project(activities={}, tasks={})",
            self.inner.graph().len(),
            self.inner.pert().len()
        )
    }
}

/// The mpr.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProject>()?;
    Ok(())
}
