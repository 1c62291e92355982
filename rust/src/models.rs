//! Core data types for the scheduling system.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Computed CPM timing for one activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTiming {
    /// Earliest possible start time (from forward pass).
    pub earliest_start: i64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: i64,
    /// Latest allowable start time (from backward pass).
    pub latest_start: i64,
    /// Latest allowable finish time (from backward pass).
    pub latest_finish: i64,
    /// Slack = latest_start - earliest_start.
    pub slack: i64,
    /// Whether the activity was placed on the critical path.
    pub is_critical: bool,
}

/// A unit of work in the CPM graph.
///
/// Dependencies are stored by name, in the order they were given, without
/// duplicates. The timing is `None` until a CPM compute has run.
///
/// Serialize-only: build one through [`Activity::new`] or from an
/// [`crate::ActivityRow`] so the duration is always validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Activity {
    name: String,
    duration: i64,
    dependencies: Vec<String>,
    timing: Option<ActivityTiming>,
}

impl Activity {
    /// Create an activity after validating its name and duration.
    pub fn new<I, S>(name: impl Into<String>, duration: i64, dependencies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into().trim().to_string();
        validate_name(&name, "Activity")?;
        if duration <= 0 {
            return Err(ScheduleError::validation(format!(
                "Duration of activity {} must be greater than zero, got {}",
                name, duration
            )));
        }

        let mut activity = Self {
            name,
            duration,
            dependencies: Vec::new(),
            timing: None,
        };
        for dep in dependencies {
            activity.add_dependency(dep.as_ref());
        }
        Ok(activity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    /// Timing from the last successful CPM compute.
    pub fn timing(&self) -> Option<&ActivityTiming> {
        self.timing.as_ref()
    }

    pub fn is_critical(&self) -> bool {
        self.timing.is_some_and(|t| t.is_critical)
    }

    /// Append a dependency name, trimmed; blanks and repeats are ignored.
    pub(crate) fn add_dependency(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.depends_on(name) {
            return false;
        }
        self.dependencies.push(name.to_string());
        true
    }

    pub(crate) fn remove_dependency(&mut self, name: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d != name);
        self.dependencies.len() != before
    }

    pub(crate) fn set_timing(&mut self, timing: ActivityTiming) {
        self.timing = Some(timing);
    }
}

/// A PERT task with its three-point estimate.
///
/// Expected duration and variance are derived once at construction, so the
/// type is serialize-only; load stored tasks through [`crate::TaskRow`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Task {
    name: String,
    optimistic: f64,
    most_likely: f64,
    pessimistic: f64,
    expected: f64,
    variance: f64,
}

impl Task {
    /// Create a task. All estimates must be finite and nonnegative;
    /// `optimistic <= most_likely <= pessimistic` is not required.
    pub fn new(
        name: impl Into<String>,
        optimistic: f64,
        most_likely: f64,
        pessimistic: f64,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        validate_name(&name, "Task")?;
        for (label, value) in [
            ("optimistic", optimistic),
            ("most likely", most_likely),
            ("pessimistic", pessimistic),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScheduleError::validation(format!(
                    "The {} estimate of task {} must be a nonnegative number, got {}",
                    label, name, value
                )));
            }
        }

        let spread = (pessimistic - optimistic) / 6.0;
        Ok(Self {
            name,
            optimistic,
            most_likely,
            pessimistic,
            expected: (optimistic + 4.0 * most_likely + pessimistic) / 6.0,
            variance: spread * spread,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optimistic(&self) -> f64 {
        self.optimistic
    }

    pub fn most_likely(&self) -> f64 {
        self.most_likely
    }

    pub fn pessimistic(&self) -> f64 {
        self.pessimistic
    }

    /// (o + 4m + p) / 6
    pub fn expected(&self) -> f64 {
        self.expected
    }

    /// ((p - o) / 6)^2
    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

fn validate_name(name: &str, kind: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ScheduleError::validation(format!(
            "{} name must not be empty",
            kind
        )));
    }
    Ok(())
}
