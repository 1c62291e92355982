//! Configuration types for the scheduling session.

use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Order in which the CPM passes visit activities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Stable topological sort of the sequence; ties keep sequence order.
    #[default]
    Topological,
    /// The sequence as given. Must already list dependencies first.
    Insertion,
}

/// What the backward pass does with a non-final activity nobody depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenEndPolicy {
    /// Fail the compute with a degenerate-input error naming the activity.
    #[default]
    Reject,
    /// Treat the project finish (`cpm_time`) as its latest finish.
    AnchorToProjectEnd,
}

/// How removing an activity treats activities that still depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Remove it and strip it from every dependent's dependency list.
    #[default]
    Cascade,
    /// Refuse the removal while dependents exist.
    Reject,
}

/// Normal CDF used for PERT completion probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CdfVariant {
    /// A&S 26.2.17 with the density factor; a true CDF.
    #[default]
    Standard,
    /// `poly(t) / 2π + 0.5` as computed by the legacy calculators. Not a
    /// distribution function, kept for reproducing their numbers.
    Legacy,
}

/// Configuration for one scheduling session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// Traversal order for the forward and backward passes
    pub traversal: TraversalOrder,
    /// Handling of activities without dependents
    pub open_ends: OpenEndPolicy,
    /// Handling of dependents when an activity is removed
    pub removal: RemovalPolicy,
    /// CDF behind PERT completion probabilities
    pub cdf: CdfVariant,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalOrder::default(),
            open_ends: OpenEndPolicy::default(),
            removal: RemovalPolicy::default(),
            cdf: CdfVariant::default(),
            verbosity: crate::logging::VERBOSITY_SILENT,
        }
    }
}

impl FromStr for TraversalOrder {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topological" => Ok(Self::Topological),
            "insertion" => Ok(Self::Insertion),
            other => Err(ScheduleError::validation(format!(
                "Unknown traversal order: {}",
                other
            ))),
        }
    }
}

impl FromStr for OpenEndPolicy {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "anchor" => Ok(Self::AnchorToProjectEnd),
            other => Err(ScheduleError::validation(format!(
                "Unknown open-end policy: {}",
                other
            ))),
        }
    }
}

impl FromStr for RemovalPolicy {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cascade" => Ok(Self::Cascade),
            "reject" => Ok(Self::Reject),
            other => Err(ScheduleError::validation(format!(
                "Unknown removal policy: {}",
                other
            ))),
        }
    }
}

impl FromStr for CdfVariant {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "legacy" => Ok(Self::Legacy),
            other => Err(ScheduleError::validation(format!(
                "Unknown CDF variant: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SchedulingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SchedulingConfig(traversal={:?}, open_ends={:?}, removal={:?}, cdf={:?}, verbosity={})",
            self.traversal, self.open_ends, self.removal, self.cdf, self.verbosity
        )
    }
}
