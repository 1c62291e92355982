//! PERT three-point estimation.
//!
//! Project totals treat every task as one serial chain: the project time is
//! the sum of expected durations and the project variance the sum of
//! variances.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::CdfVariant;
use crate::error::{Result, ScheduleError};
use crate::log_changes;
use crate::models::Task;
use crate::normal;

/// Project-level PERT totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub project_time: f64,
    pub project_variance: f64,
    pub project_std_dev: f64,
}

/// Completion probability of one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskProbability {
    pub name: String,
    pub probability: f64,
}

/// Full PERT report: totals plus a probability per task in task order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PertReport {
    pub estimate: ProjectEstimate,
    pub per_task_probability: Vec<TaskProbability>,
}

impl PertReport {
    pub fn probability_of(&self, name: &str) -> Option<f64> {
        self.per_task_probability
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.probability)
    }
}

impl fmt::Display for PertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PERT Project Time: {:.2}", self.estimate.project_time)?;
        writeln!(
            f,
            "Variance of Total Project: {:.2}",
            self.estimate.project_variance
        )?;
        writeln!(f, "Standard Deviation: {:.2}", self.estimate.project_std_dev)?;
        write!(f, "Probability of Completion:")?;
        for p in &self.per_task_probability {
            write!(f, "\n{}: {:.2}", p.name, p.probability)?;
        }
        Ok(())
    }
}

/// Sum expected durations and variances over `tasks`.
pub fn aggregate(tasks: &[Task]) -> ProjectEstimate {
    let (project_time, project_variance) = tasks
        .iter()
        .fold((0.0, 0.0), |(time, var), t| (time + t.expected(), var + t.variance()));
    ProjectEstimate {
        project_time,
        project_variance,
        project_std_dev: project_variance.sqrt(),
    }
}

/// `1 - Phi((project_time - task.expected) / project_std_dev)`.
///
/// Fails when the standard deviation is zero (or not a positive finite
/// number), where the z-score is undefined.
pub fn completion_probability(task: &Task, project_time: f64, project_std_dev: f64) -> Result<f64> {
    completion_probability_with(CdfVariant::Standard, task, project_time, project_std_dev)
}

/// [`completion_probability`] with an explicit CDF.
pub fn completion_probability_with(
    cdf: CdfVariant,
    task: &Task,
    project_time: f64,
    project_std_dev: f64,
) -> Result<f64> {
    if !(project_std_dev.is_finite() && project_std_dev > 0.0) {
        return Err(ScheduleError::degenerate(format!(
            "Cannot compute completion probability of {} with project standard deviation {}",
            task.name(),
            project_std_dev
        )));
    }
    let z = (project_time - task.expected()) / project_std_dev;
    Ok(1.0 - normal::cumulative_with(cdf, z))
}

/// Owns the PERT tasks of a session.
#[derive(Clone, Debug, Default)]
pub struct PertEstimator {
    tasks: Vec<Task>,
    positions: FxHashMap<String, usize>,
    cdf: CdfVariant,
    verbosity: u8,
}

impl PertEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: u8) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    /// Select the CDF used for completion probabilities.
    pub fn with_cdf(mut self, cdf: CdfVariant) -> Self {
        self.cdf = cdf;
        self
    }

    pub fn cdf(&self) -> CdfVariant {
        self.cdf
    }

    /// Validate and append a task. Names must be unique.
    pub fn add_task(
        &mut self,
        name: &str,
        optimistic: f64,
        most_likely: f64,
        pessimistic: f64,
    ) -> Result<Task> {
        let task = Task::new(name, optimistic, most_likely, pessimistic)?;
        if self.positions.contains_key(task.name()) {
            return Err(ScheduleError::validation(format!(
                "A task named {} already exists",
                task.name()
            )));
        }

        log_changes!(
            self.verbosity,
            "Added task {} (expected={:.3}, variance={:.3})",
            task.name(),
            task.expected(),
            task.variance()
        );
        self.positions
            .insert(task.name().to_string(), self.tasks.len());
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn remove_task(&mut self, name: &str) -> Result<Task> {
        let Some(position) = self.positions.remove(name) else {
            return Err(ScheduleError::task_not_found(name));
        };
        let task = self.tasks.remove(position);
        for p in self.positions.values_mut() {
            if *p > position {
                *p -= 1;
            }
        }
        log_changes!(self.verbosity, "Removed task {}", name);
        Ok(task)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.positions.get(name).map(|&i| &self.tasks[i])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.positions.clear();
    }

    /// Project totals and the completion probability of every task.
    pub fn compute(&self) -> Result<PertReport> {
        if self.tasks.is_empty() {
            return Err(ScheduleError::degenerate(
                "Add tasks before calculating PERT",
            ));
        }

        let estimate = aggregate(&self.tasks);
        let per_task_probability = self
            .tasks
            .iter()
            .map(|task| {
                completion_probability_with(
                    self.cdf,
                    task,
                    estimate.project_time,
                    estimate.project_std_dev,
                )
                .map(|probability| TaskProbability {
                        name: task.name().to_string(),
                        probability,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        log_changes!(
            self.verbosity,
            "PERT complete: time={:.3} variance={:.3} std_dev={:.3}",
            estimate.project_time,
            estimate.project_variance,
            estimate.project_std_dev
        );

        Ok(PertReport {
            estimate,
            per_task_probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_task(name: &str, o: f64, m: f64, p: f64) -> Task {
        Task::new(name, o, m, p).unwrap()
    }

    #[test]
    fn test_aggregate_sums_serially() {
        let tasks = vec![
            make_task("design", 2.0, 4.0, 6.0),
            make_task("build", 1.0, 3.0, 11.0),
        ];
        let estimate = aggregate(&tasks);

        // 4.0 + (1 + 12 + 11) / 6 = 8.0
        assert!((estimate.project_time - 8.0).abs() < 1e-12);
        // 4/9 + (10/6)^2 = 4/9 + 25/9 = 29/9
        assert!((estimate.project_variance - 29.0 / 9.0).abs() < 1e-12);
        assert!((estimate.project_std_dev - (29.0f64 / 9.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate(&[]), ProjectEstimate::default());
    }

    #[test]
    fn test_completion_probability_follows_formula() {
        let task = make_task("t", 2.0, 4.0, 6.0);
        // project_time == expected -> z = 0 -> 1 - 0.5
        let p = completion_probability(&task, 4.0, 1.0).unwrap();
        assert!((p - 0.5).abs() < 1e-7);

        // z = 1 -> 1 - 0.8413
        let p = completion_probability(&task, 5.0, 1.0).unwrap();
        assert!((p - 0.158_655_254).abs() < 1e-7);
    }

    #[test]
    fn test_completion_probability_zero_std_dev_is_degenerate() {
        let task = make_task("t", 3.0, 3.0, 3.0);
        let err = completion_probability(&task, 3.0, 0.0).unwrap_err();
        assert!(matches!(err, ScheduleError::DegenerateInput(_)));
        let err = completion_probability_with(CdfVariant::Legacy, &task, 3.0, 0.0).unwrap_err();
        assert!(matches!(err, ScheduleError::DegenerateInput(_)));
    }

    #[test]
    fn test_legacy_cdf_reproduces_old_probabilities() {
        let task = make_task("t", 2.0, 4.0, 6.0);
        // z = 1: 1 - 0.3956
        let p = completion_probability_with(CdfVariant::Legacy, &task, 5.0, 1.0).unwrap();
        assert!((p - 0.604_354_644).abs() < 1e-8);
        // z = -1: 1 - 0.6044
        let p = completion_probability_with(CdfVariant::Legacy, &task, 3.0, 1.0).unwrap();
        assert!((p - 0.395_645_356).abs() < 1e-8);
    }

    #[test]
    fn test_estimator_honours_cdf_variant() {
        let mut standard = PertEstimator::new();
        standard.add_task("design", 2.0, 4.0, 6.0).unwrap();
        standard.add_task("build", 1.0, 3.0, 11.0).unwrap();
        let legacy = standard.clone().with_cdf(CdfVariant::Legacy);
        assert_eq!(legacy.cdf(), CdfVariant::Legacy);

        let standard_report = standard.compute().unwrap();
        let legacy_report = legacy.compute().unwrap();
        assert_eq!(standard_report.estimate, legacy_report.estimate);

        let estimate = legacy_report.estimate;
        for (task, p) in legacy.tasks().iter().zip(&legacy_report.per_task_probability) {
            let z = (estimate.project_time - task.expected()) / estimate.project_std_dev;
            assert!((p.probability - (1.0 - normal::legacy_cumulative(z))).abs() < 1e-12);
        }
        assert_ne!(
            standard_report.probability_of("design"),
            legacy_report.probability_of("design")
        );
    }

    #[test]
    fn test_add_task_validation_leaves_estimator_untouched() {
        let mut estimator = PertEstimator::new();
        estimator.add_task("a", 1.0, 2.0, 3.0).unwrap();

        assert!(matches!(
            estimator.add_task("b", 1.0, -2.0, 3.0),
            Err(ScheduleError::Validation(_))
        ));
        assert!(matches!(
            estimator.add_task("a", 1.0, 2.0, 3.0),
            Err(ScheduleError::Validation(_))
        ));
        assert_eq!(estimator.len(), 1);
    }

    #[test]
    fn test_remove_task() {
        let mut estimator = PertEstimator::new();
        estimator.add_task("a", 1.0, 2.0, 3.0).unwrap();
        estimator.add_task("b", 2.0, 3.0, 4.0).unwrap();
        estimator.add_task("c", 3.0, 4.0, 5.0).unwrap();

        let removed = estimator.remove_task("a").unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(estimator.get("c").map(|t| t.name()), Some("c"));
        assert_eq!(
            estimator.remove_task("a").unwrap_err(),
            ScheduleError::task_not_found("a")
        );
    }

    #[test]
    fn test_compute_report() {
        let mut estimator = PertEstimator::new();
        estimator.add_task("design", 2.0, 4.0, 6.0).unwrap();
        estimator.add_task("build", 1.0, 3.0, 11.0).unwrap();

        let report = estimator.compute().unwrap();
        assert!((report.estimate.project_time - 8.0).abs() < 1e-12);
        assert_eq!(report.per_task_probability.len(), 2);
        assert_eq!(report.per_task_probability[0].name, "design");

        // Each task's expected is below the project time, so z > 0 and the
        // probability is below one half.
        for p in &report.per_task_probability {
            assert!(p.probability > 0.0 && p.probability < 0.5);
        }
        assert!(report.probability_of("build").is_some());
        assert!(report.probability_of("missing").is_none());
    }

    #[test]
    fn test_compute_without_tasks_is_degenerate() {
        let err = PertEstimator::new().compute().unwrap_err();
        assert!(matches!(err, ScheduleError::DegenerateInput(_)));
    }

    #[test]
    fn test_compute_with_zero_variance_is_degenerate() {
        let mut estimator = PertEstimator::new();
        estimator.add_task("fixed", 3.0, 3.0, 3.0).unwrap();
        let err = estimator.compute().unwrap_err();
        assert!(matches!(err, ScheduleError::DegenerateInput(_)));
    }

    #[test]
    fn test_report_display() {
        let mut estimator = PertEstimator::new();
        estimator.add_task("t", 2.0, 4.0, 6.0).unwrap();
        let text = estimator.compute().unwrap().to_string();
        assert!(text.starts_with("PERT Project Time: 4.00\n"));
        assert!(text.contains("Variance of Total Project: 0.44\n"));
        assert!(text.ends_with("t: 0.50"));
    }

    proptest! {
        #[test]
        fn prop_probability_monotone_in_expected(
            a in 0.0f64..50.0,
            b in 0.0f64..50.0,
            project_time in 0.0f64..100.0,
            std_dev in 0.1f64..10.0,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low_task = make_task("low", low, low, low);
            let high_task = make_task("high", high, high, high);

            let p_low = completion_probability(&low_task, project_time, std_dev).unwrap();
            let p_high = completion_probability(&high_task, project_time, std_dev).unwrap();

            prop_assert!((0.0..=1.0).contains(&p_low));
            // A longer expected duration never lowers 1 - Phi(z); allow the
            // approximation error near z = 0.
            prop_assert!(p_high + 2e-7 >= p_low);
        }
    }
}
