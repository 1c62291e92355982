//! A scheduling session: one activity graph and one set of PERT tasks.

use std::fmt;

use crate::config::SchedulingConfig;
use crate::cpm::{CpmResult, CpmScheduler};
use crate::error::{Result, ScheduleError, StructuralWarning};
use crate::graph::{ActivityGraph, AddedActivity, GraphSnapshot};
use crate::log_changes;
use crate::models::Task;
use crate::pert::{PertEstimator, PertReport};
use crate::store::{ActivityRow, ProjectListener, TaskRow};

/// Outcome of seeding a project from stored rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeedReport {
    pub activities_loaded: usize,
    pub tasks_loaded: usize,
    /// Unresolved dependency names found while loading activity rows.
    pub warnings: Vec<StructuralWarning>,
    /// Rows that failed validation, by name, with the reason.
    pub rejected: Vec<(String, ScheduleError)>,
}

/// Owns the state of one scheduling session.
///
/// All mutation goes through `&mut self`; share a project between threads
/// behind a single lock.
pub struct Project {
    graph: ActivityGraph,
    pert: PertEstimator,
    scheduler: CpmScheduler,
    listener: Option<Box<dyn ProjectListener>>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(SchedulingConfig::default())
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("config", self.scheduler.config())
            .field("activities", &self.graph.len())
            .field("tasks", &self.pert.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Project {
    pub fn new(config: SchedulingConfig) -> Self {
        Self {
            graph: ActivityGraph::with_config(&config),
            pert: PertEstimator::with_verbosity(config.verbosity).with_cdf(config.cdf),
            scheduler: CpmScheduler::new(config),
            listener: None,
        }
    }

    /// Attach a listener that mirrors every change into a store.
    pub fn with_listener(mut self, listener: Box<dyn ProjectListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &SchedulingConfig {
        self.scheduler.config()
    }

    pub fn graph(&self) -> &ActivityGraph {
        &self.graph
    }

    pub fn pert(&self) -> &PertEstimator {
        &self.pert
    }

    /// Load stored rows in order. Invalid rows are skipped and reported;
    /// the listener is not notified.
    pub fn seed<A, T>(&mut self, activity_rows: A, task_rows: T) -> SeedReport
    where
        A: IntoIterator<Item = ActivityRow>,
        T: IntoIterator<Item = TaskRow>,
    {
        let mut report = SeedReport::default();

        for row in activity_rows {
            match self
                .graph
                .add_activity(&row.name, row.duration, row.dependency_names())
            {
                Ok(added) => {
                    report.activities_loaded += 1;
                    report.warnings.extend(added.warnings);
                }
                Err(err) => {
                    tracing::warn!(row = %row.name, error = %err, "skipping activity row");
                    report.rejected.push((row.name, err));
                }
            }
        }

        for row in task_rows {
            match self
                .pert
                .add_task(&row.name, row.optimistic, row.most_likely, row.pessimistic)
            {
                Ok(_) => report.tasks_loaded += 1,
                Err(err) => {
                    tracing::warn!(row = %row.name, error = %err, "skipping task row");
                    report.rejected.push((row.name, err));
                }
            }
        }

        log_changes!(
            self.config().verbosity,
            "Seeded {} activities and {} tasks ({} rows rejected)",
            report.activities_loaded,
            report.tasks_loaded,
            report.rejected.len()
        );
        report
    }

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
        let added = self.graph.add_activity(name, duration, dependency_names)?;
        if let Some(listener) = self.listener.as_mut() {
            listener.activity_added(&ActivityRow::from(&added.activity));
        }
        Ok(added)
    }

    /// Remove an activity; returns the dependents whose references were
    /// cleaned up.
    pub fn remove_activity(&mut self, name: &str) -> Result<Vec<String>> {
        let dependents = self.graph.remove_activity(name)?;
        if let Some(listener) = self.listener.as_mut() {
            listener.activity_removed(name);
        }
        Ok(dependents)
    }

    /// Run CPM over the graph's activities in insertion order.
    pub fn compute_cpm(&mut self) -> Result<CpmResult> {
        self.scheduler.compute(self.graph.activities_mut())
    }

    pub fn add_task(
        &mut self,
        name: &str,
        optimistic: f64,
        most_likely: f64,
        pessimistic: f64,
    ) -> Result<Task> {
        let task = self
            .pert
            .add_task(name, optimistic, most_likely, pessimistic)?;
        if let Some(listener) = self.listener.as_mut() {
            listener.task_added(&TaskRow::from(&task));
        }
        Ok(task)
    }

    pub fn remove_task(&mut self, name: &str) -> Result<Task> {
        let task = self.pert.remove_task(name)?;
        if let Some(listener) = self.listener.as_mut() {
            listener.task_removed(name);
        }
        Ok(task)
    }

    pub fn compute_pert(&self) -> Result<PertReport> {
        self.pert.compute()
    }

    /// Read-only graph view for renderers.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CdfVariant;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum Event {
        ActivityAdded(ActivityRow),
        ActivityRemoved(String),
        TaskAdded(String),
        TaskRemoved(String),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl ProjectListener for Recorder {
        fn activity_added(&mut self, row: &ActivityRow) {
            self.0.lock().unwrap().push(Event::ActivityAdded(row.clone()));
        }
        fn activity_removed(&mut self, name: &str) {
            self.0
                .lock()
                .unwrap()
                .push(Event::ActivityRemoved(name.to_string()));
        }
        fn task_added(&mut self, row: &TaskRow) {
            self.0
                .lock()
                .unwrap()
                .push(Event::TaskAdded(row.name.clone()));
        }
        fn task_removed(&mut self, name: &str) {
            self.0
                .lock()
                .unwrap()
                .push(Event::TaskRemoved(name.to_string()));
        }
    }

    fn activity_row(name: &str, duration: i64, dependency: &str) -> ActivityRow {
        ActivityRow {
            name: name.to_string(),
            duration,
            dependency: dependency.to_string(),
        }
    }

    #[test]
    fn test_listener_sees_only_successful_changes() {
        let recorder = Recorder::default();
        let mut project = Project::default().with_listener(Box::new(recorder.clone()));

        project.add_activity("A", 3, Vec::<&str>::new()).unwrap();
        project.add_activity("B", 2, ["A", "ghost"]).unwrap();
        assert!(project.add_activity("C", 0, ["A"]).is_err());
        project.remove_activity("B").unwrap();
        assert!(project.remove_activity("B").is_err());
        project.add_task("t", 1.0, 2.0, 3.0).unwrap();
        assert!(project.add_task("u", -1.0, 2.0, 3.0).is_err());
        project.remove_task("t").unwrap();

        let events = recorder.0.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                Event::ActivityAdded(activity_row("A", 3, "")),
                Event::ActivityAdded(activity_row("B", 2, "A")),
                Event::ActivityRemoved("B".to_string()),
                Event::TaskAdded("t".to_string()),
                Event::TaskRemoved("t".to_string()),
            ]
        );
    }

    #[test]
    fn test_seed_reports_skipped_rows() {
        let recorder = Recorder::default();
        let mut project = Project::default().with_listener(Box::new(recorder.clone()));

        let report = project.seed(
            vec![
                activity_row("A", 3, ""),
                activity_row("B", 2, "A"),
                activity_row("bad", -1, "A"),
                activity_row("C", 4, "A,missing"),
                activity_row("D", 1, "B,C"),
            ],
            vec![TaskRow {
                name: "t".to_string(),
                optimistic: 2.0,
                most_likely: 4.0,
                pessimistic: 6.0,
            }],
        );

        assert_eq!(report.activities_loaded, 4);
        assert_eq!(report.tasks_loaded, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, "bad");
        assert_eq!(
            report.warnings,
            vec![StructuralWarning::UnresolvedDependency {
                activity: "C".to_string(),
                dependency: "missing".to_string(),
            }]
        );
        assert!(recorder.0.lock().unwrap().is_empty());

        let result = project.compute_cpm().unwrap();
        assert_eq!(result.cpm_time, 8);
    }

    #[test]
    fn test_failed_cpm_keeps_session_usable() {
        let mut project = Project::default();
        project.add_activity("A", 3, Vec::<&str>::new()).unwrap();
        project.add_activity("B", 2, ["A"]).unwrap();
        project.add_activity("C", 4, ["A"]).unwrap();

        // B is an open end
        assert!(matches!(
            project.compute_cpm(),
            Err(ScheduleError::DegenerateInput(_))
        ));

        project.add_activity("D", 1, ["B", "C"]).unwrap();
        let result = project.compute_cpm().unwrap();
        assert_eq!(result.cpm_time, 8);

        let snapshot = project.snapshot();
        assert_eq!(snapshot.critical, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_compute_pert_through_project() {
        let mut project = Project::default();
        project.add_task("a", 2.0, 4.0, 6.0).unwrap();
        project.add_task("b", 1.0, 2.0, 9.0).unwrap();
        let report = project.compute_pert().unwrap();
        assert!((report.estimate.project_time - 7.0).abs() < 1e-12);
        assert_eq!(report.per_task_probability.len(), 2);
    }

    #[test]
    fn test_cpm_overflow_is_reported_not_panicked() {
        let mut project = Project::default();
        project.add_activity("A", i64::MAX, Vec::<&str>::new()).unwrap();
        project.add_activity("B", 1, ["A"]).unwrap();

        assert!(matches!(
            project.compute_cpm(),
            Err(ScheduleError::DegenerateInput(_))
        ));
        assert!(project.graph().activities().iter().all(|a| a.timing().is_none()));

        // Still usable once the offending activity is gone
        project.remove_activity("A").unwrap();
        assert_eq!(project.compute_cpm().unwrap().cpm_time, 1);
    }

    #[test]
    fn test_config_cdf_reaches_pert() {
        let config = SchedulingConfig {
            cdf: CdfVariant::Legacy,
            ..SchedulingConfig::default()
        };
        let mut project = Project::new(config);
        project.add_task("a", 2.0, 4.0, 6.0).unwrap();
        project.add_task("b", 1.0, 2.0, 9.0).unwrap();
        assert_eq!(project.pert().cdf(), CdfVariant::Legacy);

        let report = project.compute_pert().unwrap();
        let estimate = report.estimate;
        let a = project.pert().get("a").unwrap();
        let z = (estimate.project_time - a.expected()) / estimate.project_std_dev;
        let expected = 1.0 - crate::normal::legacy_cumulative(z);
        assert!((report.probability_of("a").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_project_can_move_between_threads() {
        // The Python class holds a Project without a lock and needs it Send
        fn assert_send<T: Send>() {}
        assert_send::<Project>();

        let mut project = Project::default().with_listener(Box::new(Recorder::default()));
        project.add_activity("A", 3, Vec::<&str>::new()).unwrap();
        let handle = std::thread::spawn(move || project.compute_cpm().map(|r| r.cpm_time));
        assert_eq!(handle.join().unwrap(), Ok(3));
    }

    #[test]
    fn test_debug_output() {
        let project = Project::default();
        let text = format!("{:?}", project);
        assert!(text.contains("activities: 0"));
    }
}
