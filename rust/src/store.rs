//! Row formats and change notifications for an external store.
//!
//! The core does no I/O. A store seeds a [`crate::Project`] from rows on
//! startup and keeps itself in sync through a [`ProjectListener`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::{Activity, Task};

/// Stored form of an activity: dependencies as one comma-separated string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub name: String,
    pub duration: i64,
    #[serde(default)]
    pub dependency: String,
}

impl ActivityRow {
    /// Dependency names from the comma-separated column, trimmed, blanks dropped.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependency
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<&Activity> for ActivityRow {
    fn from(activity: &Activity) -> Self {
        Self {
            name: activity.name().to_string(),
            duration: activity.duration(),
            dependency: activity.dependencies().join(","),
        }
    }
}

impl TryFrom<ActivityRow> for Activity {
    type Error = ScheduleError;

    fn try_from(row: ActivityRow) -> Result<Self> {
        Activity::new(row.name.as_str(), row.duration, row.dependency_names())
    }
}

/// Stored form of a PERT task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub name: String,
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            optimistic: task.optimistic(),
            most_likely: task.most_likely(),
            pessimistic: task.pessimistic(),
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = ScheduleError;

    fn try_from(row: TaskRow) -> Result<Self> {
        Task::new(row.name, row.optimistic, row.most_likely, row.pessimistic)
    }
}

/// Receives every successful mutation of a project.
///
/// Called after the change is applied; never called for rejected changes or
/// for rows loaded through seeding.
pub trait ProjectListener: Send {
    fn activity_added(&mut self, _row: &ActivityRow) {}
    fn activity_removed(&mut self, _name: &str) {}
    fn task_added(&mut self, _row: &TaskRow) {}
    fn task_removed(&mut self, _name: &str) {}
}
