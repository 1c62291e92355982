//! Error and warning types shared by the graph, CPM and PERT modules.

use std::fmt;

use thiserror::Error;

/// Errors returned by the scheduling core.
///
/// Every failing operation leaves the state it was called on untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Rejected input: non-positive duration, negative estimate, missing or
    /// duplicate name, or an activity order that violates its dependencies.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Lookup or removal of an unknown activity or task.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
    /// Removal refused because other activities still depend on `name`.
    #[error("Activity {name} is still required by: {}", .dependents.join(", "))]
    ReferentialIntegrity { name: String, dependents: Vec<String> },
    /// Input the computation cannot give a finite answer for.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// The activity set contains a dependency cycle.
    #[error("Circular dependency detected involving: {}", .involved.join(", "))]
    CircularDependency { involved: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

/// What kind of entity a [`ScheduleError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Activity,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Activity => write!(f, "Activity"),
            EntityKind::Task => write!(f, "Task"),
        }
    }
}

impl ScheduleError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ScheduleError::Validation(message.into())
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        ScheduleError::DegenerateInput(message.into())
    }

    pub(crate) fn activity_not_found(name: &str) -> Self {
        ScheduleError::NotFound {
            kind: EntityKind::Activity,
            name: name.to_string(),
        }
    }

    pub(crate) fn task_not_found(name: &str) -> Self {
        ScheduleError::NotFound {
            kind: EntityKind::Task,
            name: name.to_string(),
        }
    }
}

/// Non-fatal structural problems reported next to a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralWarning {
    /// `activity` named a dependency that is not (yet) in the graph; the
    /// edge was not created.
    UnresolvedDependency { activity: String, dependency: String },
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralWarning::UnresolvedDependency {
                activity,
                dependency,
            } => write!(
                f,
                "Dependency {:?} of activity {:?} does not match any existing activity",
                dependency, activity
            ),
        }
    }
}
