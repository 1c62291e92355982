//! Critical Path Method and PERT scheduling core.
//!
//! [`Project`] is the session type most callers want: it owns an
//! [`ActivityGraph`] for CPM and a [`PertEstimator`] for three-point
//! estimates. The pieces are also usable on their own.

pub mod config;
pub mod cpm;
pub mod error;
pub mod graph;
mod interner;
pub mod logging;
mod models;
pub mod normal;
pub mod pert;
mod project;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use config::{CdfVariant, OpenEndPolicy, RemovalPolicy, SchedulingConfig, TraversalOrder};
pub use cpm::{CpmResult, CpmScheduler};
pub use error::{EntityKind, Result, ScheduleError, StructuralWarning};
pub use graph::{ActivityGraph, AddedActivity, GraphSnapshot, SnapshotEdge, SnapshotNode};
pub use models::{Activity, ActivityTiming, Task};
pub use pert::{
    aggregate, completion_probability, completion_probability_with, PertEstimator, PertReport, ProjectEstimate,
    TaskProbability,
};
pub use project::{Project, SeedReport};
pub use store::{ActivityRow, ProjectListener, TaskRow};
