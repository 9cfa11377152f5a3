//! Which nodes make up an interval.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::instrument;

use crate::domain::arena::Arbor;
use crate::domain::entities::{NodeId, Partition};
use crate::domain::error::{DomainError, DomainResult};

/// Nodes of the interval `start -> end`.
///
/// The path from `start` to `end` is always included. Side branches leaving
/// the path at an interior node are added as well, but expansion never enters
/// a node in `other_boundaries`, and it does not branch off at a path node that
/// is itself another interval's boundary. Side branches at `start` and `end`
/// belong to the neighbouring intervals.
#[instrument(level = "debug", skip(arbor, other_boundaries))]
pub fn interval_nodes(
    arbor: &Arbor,
    start: NodeId,
    end: NodeId,
    other_boundaries: &HashSet<NodeId>,
) -> DomainResult<BTreeSet<NodeId>> {
    let path = arbor
        .path_from_ancestor(start, end)?
        .ok_or(DomainError::UnreachableBoundary { start, end })?;
    let on_path: HashSet<NodeId> = path.iter().copied().collect();
    let mut nodes: BTreeSet<NodeId> = path.iter().copied().collect();

    let interior = path.iter().skip(1).take(path.len().saturating_sub(2));
    let mut queue = VecDeque::new();
    for &node in interior {
        if other_boundaries.contains(&node) {
            continue;
        }
        for child in arbor.children(node)? {
            if !on_path.contains(&child) {
                queue.push_back(child);
            }
        }
    }

    while let Some(node) = queue.pop_front() {
        if other_boundaries.contains(&node) || !nodes.insert(node) {
            continue;
        }
        queue.extend(arbor.children(node)?);
    }

    Ok(nodes)
}

impl Partition {
    /// Nodes of the interval at `index`, bounded by all other intervals.
    pub fn members(&self, arbor: &Arbor, index: usize) -> DomainResult<BTreeSet<NodeId>> {
        let interval = self.intervals.get(index).ok_or_else(|| {
            DomainError::invalid_configuration(format!(
                "interval index {index} out of range ({} intervals)",
                self.intervals.len()
            ))
        })?;
        let others: HashSet<NodeId> = self
            .intervals
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .flat_map(|(_, other)| [other.start, other.end])
            .filter(|&id| id != interval.start && id != interval.end)
            .collect();
        interval_nodes(arbor, interval.start, interval.end, &others)
    }
}
