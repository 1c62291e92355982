//! Activity dependency graph.
//!
//! Activities are kept in insertion order. A dependency can only be linked
//! when it already exists, so insertion order always lists dependencies
//! before their dependents.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{RemovalPolicy, SchedulingConfig};
use crate::error::{Result, ScheduleError, StructuralWarning};
use crate::models::{Activity, ActivityTiming};
use crate::{log_changes, log_checks};

/// Outcome of adding an activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedActivity {
    /// The activity as stored, with only the resolved dependencies.
    pub activity: Activity,
    /// Dependency names that did not resolve and were left out.
    pub warnings: Vec<StructuralWarning>,
}

/// Directed graph of activities; an edge `a -> b` means `a` must finish
/// before `b` starts.
#[derive(Clone, Debug, Default)]
pub struct ActivityGraph {
    activities: Vec<Activity>,
    positions: FxHashMap<String, usize>,
    removal: RemovalPolicy,
    verbosity: u8,
}

impl ActivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph using the removal policy and verbosity of `config`.
    pub fn with_config(config: &SchedulingConfig) -> Self {
        Self {
            removal: config.removal,
            verbosity: config.verbosity,
            ..Self::default()
        }
    }

    /// Add an activity after every existing one.
    ///
    /// Dependency names are resolved against activities already in the
    /// graph. Names that do not resolve produce a warning instead of an edge.
    /// Fails without touching the graph on an invalid duration, a blank name
    /// or a name that is already taken.
    pub fn add_activity<I, S>(
        &mut self,
        name: &str,
        duration: i64,
        dependency_names: I,
    ) -> Result<AddedActivity>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut activity = Activity::new(name, duration, std::iter::empty::<&str>())?;
        if self.positions.contains_key(activity.name()) {
            return Err(ScheduleError::validation(format!(
                "An activity named {} already exists",
                activity.name()
            )));
        }

        let mut warnings = Vec::new();
        for dep in dependency_names {
            let dep = dep.as_ref().trim();
            if dep.is_empty() {
                continue;
            }
            if self.positions.contains_key(dep) {
                activity.add_dependency(dep);
            } else {
                tracing::warn!(
                    activity = activity.name(),
                    dependency = dep,
                    "unresolved dependency dropped"
                );
                let warning = StructuralWarning::UnresolvedDependency {
                    activity: activity.name().to_string(),
                    dependency: dep.to_string(),
                };
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }

        log_changes!(
            self.verbosity,
            "Added activity {} (duration={}, deps={:?})",
            activity.name(),
            activity.duration(),
            activity.dependencies()
        );

        self.positions
            .insert(activity.name().to_string(), self.activities.len());
        self.activities.push(activity.clone());

        Ok(AddedActivity { activity, warnings })
    }

    /// Remove an activity by name.
    ///
    /// Under [`RemovalPolicy::Cascade`] the name is also stripped from every
    /// dependent, and the dependents touched are returned in graph order.
    /// Under [`RemovalPolicy::Reject`] the removal fails while any dependent
    /// exists. Either way no dangling reference is left behind.
    pub fn remove_activity(&mut self, name: &str) -> Result<Vec<String>> {
        let Some(&position) = self.positions.get(name) else {
            return Err(ScheduleError::activity_not_found(name));
        };

        let dependents = self.dependents_of(name);
        if !dependents.is_empty() && self.removal == RemovalPolicy::Reject {
            return Err(ScheduleError::ReferentialIntegrity {
                name: name.to_string(),
                dependents,
            });
        }

        self.activities.remove(position);
        for activity in &mut self.activities {
            if activity.remove_dependency(name) {
                log_checks!(
                    self.verbosity,
                    "Dropped dependency {} from {}",
                    name,
                    activity.name()
                );
            }
        }
        self.reindex();

        log_changes!(
            self.verbosity,
            "Removed activity {} ({} dependents updated)",
            name,
            dependents.len()
        );
        Ok(dependents)
    }

    /// Activities in insertion order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub(crate) fn activities_mut(&mut self) -> &mut [Activity] {
        &mut self.activities
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.positions.get(name).map(|&i| &self.activities[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Names of activities that list `name` as a dependency, in graph order.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.activities
            .iter()
            .filter(|a| a.depends_on(name))
            .map(|a| a.name().to_string())
            .collect()
    }

    /// All edges as `(dependency, dependent)`, grouped by dependent in graph order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.activities.iter().flat_map(|a| {
            a.dependencies()
                .iter()
                .map(move |dep| (dep.as_str(), a.name()))
        })
    }

    /// Drop every activity.
    pub fn clear(&mut self) {
        self.activities.clear();
        self.positions.clear();
    }

    /// Read-only view of nodes, edges and the current critical set.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .activities
                .iter()
                .map(|a| SnapshotNode {
                    name: a.name().to_string(),
                    duration: a.duration(),
                    timing: a.timing().copied(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|(from, to)| SnapshotEdge {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
            critical: self
                .activities
                .iter()
                .filter(|a| a.is_critical())
                .map(|a| a.name().to_string())
                .collect(),
        }
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (i, activity) in self.activities.iter().enumerate() {
            self.positions.insert(activity.name().to_string(), i);
        }
    }
}

/// Serializable picture of the graph handed to renderers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
    /// Names of activities marked critical by the last compute.
    pub critical: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub name: String,
    pub duration: i64,
    pub timing: Option<ActivityTiming>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub from: String,
    pub to: String,
}
