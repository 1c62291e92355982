//! Critical Path Method using forward and backward passes.
//!
//! The passes run over a traversal order derived from the activity sequence
//! (see [`TraversalOrder`]). The first activity of that order starts at 0 and
//! the last one is the end activity whose earliest finish is the project
//! duration. Timings are computed into scratch vectors and written back only
//! when the whole computation succeeds.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{OpenEndPolicy, SchedulingConfig, TraversalOrder};
use crate::error::{Result, ScheduleError};
use crate::interner::{ActivityIdx, NameIndex};
use crate::models::{Activity, ActivityTiming};
use crate::{log_changes, log_checks, log_debug};

/// Result of a CPM computation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpmResult {
    /// Critical activities in the order the backward pass found them: the end
    /// activity first, then walking back towards the start.
    pub critical_path: Vec<String>,
    /// Earliest finish of the end activity.
    pub cpm_time: i64,
}

impl CpmResult {
    /// Critical path from the start activity to the end activity.
    pub fn start_to_end(&self) -> impl Iterator<Item = &str> + '_ {
        self.critical_path.iter().rev().map(|s| s.as_str())
    }
}

impl fmt::Display for CpmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Critical Path:")?;
        for name in self.start_to_end() {
            writeln!(f, "{}", name)?;
        }
        write!(f, "\nCPM Time: {}", self.cpm_time)
    }
}

/// Reverse dependency lists: `dependents[i]` holds every activity that
/// depends on activity `i`.
pub(crate) type DependentsMap = Vec<Vec<ActivityIdx>>;

/// Build the dependents map from resolved dependency lists.
fn build_dependents_map(deps: &[Vec<ActivityIdx>]) -> DependentsMap {
    let mut dependents: DependentsMap = vec![Vec::new(); deps.len()];
    for (idx, task_deps) in deps.iter().enumerate() {
        for &dep in task_deps {
            dependents[dep].push(idx);
        }
    }
    dependents
}

/// CPM scheduler. Stateless apart from its configuration.
#[derive(Clone, Debug, Default)]
pub struct CpmScheduler {
    config: SchedulingConfig,
}

impl CpmScheduler {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Run the forward and backward passes over `activities` and store the
    /// resulting timing on each of them.
    ///
    /// An empty sequence yields an empty result. On error no activity is
    /// modified.
    pub fn compute(&self, activities: &mut [Activity]) -> Result<CpmResult> {
        if activities.is_empty() {
            tracing::warn!("CPM requested for an empty activity set");
            return Ok(CpmResult::default());
        }

        let verbosity = self.config.verbosity;
        let (index, deps) = resolve(activities)?;
        let dependents = build_dependents_map(&deps);

        let order = match self.config.traversal {
            TraversalOrder::Topological => topological_order(&index, &deps, &dependents)?,
            TraversalOrder::Insertion => insertion_order(&index, &deps)?,
        };
        log_debug!(
            verbosity,
            "CPM traversal order: {:?}",
            order
                .iter()
                .filter_map(|&i| index.resolve(i))
                .collect::<Vec<_>>()
        );

        let n = activities.len();
        let mut timings = vec![ActivityTiming::default(); n];

        // Forward pass. The first activity in `order` has no dependencies,
        // so it starts at 0 like every other source.
        for &idx in &order {
            let earliest_start = deps[idx]
                .iter()
                .map(|&dep| timings[dep].earliest_finish)
                .max()
                .unwrap_or(0);
            let earliest_finish = earliest_start
                .checked_add(activities[idx].duration())
                .ok_or_else(|| overflow(&activities[idx]))?;
            let timing = &mut timings[idx];
            timing.earliest_start = earliest_start;
            timing.earliest_finish = earliest_finish;
            log_checks!(
                verbosity,
                "Forward: {} ES={} EF={}",
                activities[idx].name(),
                timing.earliest_start,
                timing.earliest_finish
            );
        }

        let (&end, rest) = order
            .split_last()
            .ok_or_else(|| ScheduleError::degenerate("CPM traversal order is empty"))?;
        let cpm_time = timings[end].earliest_finish;

        let mut critical_path = Vec::new();
        {
            let timing = &mut timings[end];
            timing.latest_finish = timing.earliest_finish;
            // EF - duration == ES, which the forward pass already produced
            timing.latest_start = timing.earliest_start;
            timing.slack = 0;
            timing.is_critical = true;
        }
        critical_path.push(activities[end].name().to_string());

        // Backward pass: every dependent of `idx` comes later in `order`, so
        // its latest start is already final here.
        for &idx in rest.iter().rev() {
            let duration = activities[idx].duration();
            let latest_finish = match dependents[idx]
                .iter()
                .map(|&d| timings[d].latest_start)
                .min()
            {
                Some(latest_finish) => latest_finish,
                None => match self.config.open_ends {
                    OpenEndPolicy::Reject => {
                        return Err(ScheduleError::degenerate(format!(
                            "Activity {} has no dependents and is not the end activity {}; \
                             its latest start is unbounded",
                            activities[idx].name(),
                            activities[end].name()
                        )));
                    }
                    OpenEndPolicy::AnchorToProjectEnd => cpm_time,
                },
            };

            let latest_start = latest_finish
                .checked_sub(duration)
                .ok_or_else(|| overflow(&activities[idx]))?;
            let slack = latest_start
                .checked_sub(timings[idx].earliest_start)
                .ok_or_else(|| overflow(&activities[idx]))?;

            let timing = &mut timings[idx];
            timing.latest_finish = latest_finish;
            timing.latest_start = latest_start;
            timing.slack = slack;
            timing.is_critical = timing.slack == 0;
            log_checks!(
                verbosity,
                "Backward: {} LS={} LF={} slack={}",
                activities[idx].name(),
                timing.latest_start,
                timing.latest_finish,
                timing.slack
            );

            if timing.is_critical {
                critical_path.push(activities[idx].name().to_string());
            }
        }

        for (activity, timing) in activities.iter_mut().zip(timings) {
            activity.set_timing(timing);
        }

        log_changes!(
            verbosity,
            "CPM complete: cpm_time={} critical={:?}",
            cpm_time,
            critical_path
        );

        Ok(CpmResult {
            critical_path,
            cpm_time,
        })
    }
}

fn overflow(activity: &Activity) -> ScheduleError {
    ScheduleError::degenerate(format!(
        "Schedule length overflows at activity {}",
        activity.name()
    ))
}

/// Index the sequence by name and resolve every dependency to an index.
fn resolve(activities: &[Activity]) -> Result<(NameIndex, Vec<Vec<ActivityIdx>>)> {
    let mut index = NameIndex::with_capacity(activities.len());
    for activity in activities {
        if index.insert(activity.name()).is_err() {
            return Err(ScheduleError::validation(format!(
                "Activity {} appears more than once",
                activity.name()
            )));
        }
    }

    let mut deps = Vec::with_capacity(activities.len());
    for activity in activities {
        let mut resolved = Vec::with_capacity(activity.dependencies().len());
        for dep in activity.dependencies() {
            match index.get(dep) {
                Some(idx) => resolved.push(idx),
                None => {
                    return Err(ScheduleError::degenerate(format!(
                        "Activity {} depends on {}, which is not in the activity set",
                        activity.name(),
                        dep
                    )));
                }
            }
        }
        deps.push(resolved);
    }

    Ok((index, deps))
}

/// Kahn's algorithm, always releasing the ready activity with the lowest
/// sequence position. A sequence that already lists dependencies first comes
/// back unchanged.
fn topological_order(
    index: &NameIndex,
    deps: &[Vec<ActivityIdx>],
    dependents: &DependentsMap,
) -> Result<Vec<ActivityIdx>> {
    let n = deps.len();
    let mut in_degree: Vec<usize> = deps.iter().map(|d| d.len()).collect();

    let mut ready: BinaryHeap<Reverse<ActivityIdx>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() != n {
        let involved = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .filter_map(|(idx, _)| index.resolve(idx).map(str::to_string))
            .collect();
        return Err(ScheduleError::CircularDependency { involved });
    }

    Ok(order)
}

/// The sequence itself, after checking that every dependency precedes its
/// dependent.
fn insertion_order(index: &NameIndex, deps: &[Vec<ActivityIdx>]) -> Result<Vec<ActivityIdx>> {
    for (idx, task_deps) in deps.iter().enumerate() {
        if let Some(&late) = task_deps.iter().find(|&&dep| dep >= idx) {
            return Err(ScheduleError::validation(format!(
                "Activity {} is listed before its dependency {}",
                index.resolve(idx).unwrap_or("?"),
                index.resolve(late).unwrap_or("?")
            )));
        }
    }
    Ok((0..deps.len()).collect())
}
