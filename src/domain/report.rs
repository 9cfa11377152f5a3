//! Advisory length report for a partition.
//!
//! Intervals whose measured length is further than `max_diff` away from the
//! target are flagged for the user. Nothing is rejected here.

use std::collections::HashSet;

use tracing::warn;

use crate::domain::arena::Arbor;
use crate::domain::distance::distance_between;
use crate::domain::entities::{Interval, NodeId, Partition, Positions};
use crate::domain::error::DomainResult;

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalLength {
    pub interval: Interval,
    pub length: f64,
    /// Signed difference to the target length
    pub deviation: f64,
    /// Last interval of its path; expected to be short
    pub terminal: bool,
    pub exceeds_max_diff: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionReport {
    pub target_length: f64,
    pub max_diff: f64,
    pub intervals: Vec<IntervalLength>,
    pub added_nodes: usize,
}

impl PartitionReport {
    /// Non-terminal intervals deviating more than `max_diff` from the target.
    pub fn flagged(&self) -> impl Iterator<Item = &IntervalLength> {
        self.intervals.iter().filter(|i| i.exceeds_max_diff)
    }

    pub fn total_length(&self) -> f64 {
        self.intervals.iter().map(|i| i.length).sum()
    }

    pub fn mean_length(&self) -> Option<f64> {
        (!self.intervals.is_empty()).then(|| self.total_length() / self.intervals.len() as f64)
    }
}

/// `max_diff` as the workflow derives it: a fraction of the target length.
pub fn max_diff(target_length: f64, max_diff_percent: f64) -> f64 {
    target_length * max_diff_percent
}

/// Measure every interval of `partition` against `target_length`.
pub fn report(
    arbor: &Arbor,
    positions: &Positions,
    partition: &Partition,
    target_length: f64,
    max_diff: f64,
) -> DomainResult<PartitionReport> {
    let starts: HashSet<NodeId> = partition.intervals.iter().map(|i| i.start).collect();

    let mut intervals = Vec::with_capacity(partition.intervals.len());
    for interval in &partition.intervals {
        let length = distance_between(arbor, positions, interval.start, interval.end)?;
        let deviation = length - target_length;
        let terminal = !starts.contains(&interval.end);
        let exceeds_max_diff = !terminal && deviation.abs() > max_diff;
        if exceeds_max_diff {
            warn!(
                "interval {} -> {} is {:.1} long, {:+.1} off target",
                interval.start, interval.end, length, deviation
            );
        }
        intervals.push(IntervalLength {
            interval: *interval,
            length,
            deviation,
            terminal,
            exceeds_max_diff,
        });
    }

    Ok(PartitionReport {
        target_length,
        max_diff,
        intervals,
        added_nodes: partition.added_nodes.len(),
    })
}
