//! Interval partitioning of sampler domains.
//!
//! Every path from the domain start to one of its end nodes, or to a leaf of
//! the domain sub-tree that no end lies beyond, is cut into consecutive
//! intervals of (approximately) the target length. Paths are
//! handled longest first. A later path starts at the node where it leaves
//! already partitioned territory, so branches share their branch node as
//! an interval boundary.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, instrument, trace};

use crate::domain::arena::Arbor;
use crate::domain::distance::{edge_length, position_of};
use crate::domain::entities::{
    Domain, Interval, NodeId, Partition, PartitionOptions, Positions, SynthesizedNode,
};
use crate::domain::error::{DomainError, DomainResult};

/// Relative tolerance for treating an accumulated length as an exact match.
const LENGTH_EPSILON: f64 = 1e-9;

/// Partition `domain` into intervals of `options.target_length`.
///
/// `arbor` and `positions` receive any synthesized boundary nodes, so they
/// must be a working copy. All validation happens up front: on error neither
/// is modified and no partial result is returned.
#[instrument(level = "debug", skip(arbor, positions), fields(start = domain.start, ends = domain.ends.len()))]
pub fn partition(
    arbor: &mut Arbor,
    positions: &mut Positions,
    domain: &Domain,
    options: &PartitionOptions,
) -> DomainResult<Partition> {
    options.validate()?;
    let paths = domain_paths(arbor, domain)?;
    for id in paths.iter().flatten() {
        position_of(positions, *id)?;
    }

    let mut partitioner = Partitioner {
        arbor,
        positions,
        options,
        partition: Partition::default(),
    };
    let mut covered: HashSet<NodeId> = HashSet::from([domain.start]);
    for path in &paths {
        // Covered nodes always form a prefix of the path, starting at the domain start
        let first = path.iter().rposition(|id| covered.contains(id)).unwrap_or(0);
        let segment = &path[first..];
        covered.extend(segment.iter().copied());
        if segment.len() < 2 {
            continue;
        }
        partitioner.walk(segment)?;
    }

    let partition = partitioner.partition;
    debug!(
        "{} intervals, {} synthesized nodes",
        partition.intervals.len(),
        partition.added_nodes.len()
    );
    Ok(partition)
}

/// Validate the domain and return its start-to-end paths, longest first.
fn domain_paths(arbor: &Arbor, domain: &Domain) -> DomainResult<Vec<Vec<NodeId>>> {
    if !arbor.contains(domain.start) {
        return Err(DomainError::invalid_domain(format!(
            "start node {} is not part of the arbor",
            domain.start
        )));
    }

    let mut paths = Vec::with_capacity(domain.ends.len());
    for &end in &domain.ends {
        if !arbor.contains(end) {
            return Err(DomainError::invalid_domain(format!(
                "end node {end} is not part of the arbor"
            )));
        }
        let path = arbor
            .path_from_ancestor(domain.start, end)?
            .ok_or_else(|| {
                DomainError::invalid_domain(format!(
                    "end node {end} is not downstream of start node {}",
                    domain.start
                ))
            })?;
        if let Some(inner) = path[..path.len() - 1]
            .iter()
            .find(|id| domain.ends.contains(id))
        {
            return Err(DomainError::invalid_domain(format!(
                "end node {end} lies beyond end node {inner}"
            )));
        }
        paths.push(path);
    }

    // Twigs not leading to a declared end still belong to the domain
    let implicit = implicit_ends(arbor, domain)?;
    if !implicit.is_empty() {
        debug!("{} leaves of the domain are implicit ends", implicit.len());
    }
    for end in implicit {
        if let Some(path) = arbor.path_from_ancestor(domain.start, end)? {
            paths.push(path);
        }
    }

    paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.last().cmp(&b.last())));
    Ok(paths)
}

/// Leaves below the domain start that are not declared ends, without
/// descending past any declared end.
fn implicit_ends(arbor: &Arbor, domain: &Domain) -> DomainResult<Vec<NodeId>> {
    let mut leaves = Vec::new();
    let mut queue = VecDeque::from([domain.start]);
    while let Some(node) = queue.pop_front() {
        if domain.ends.contains(&node) {
            continue;
        }
        let children = arbor.children(node)?;
        if children.is_empty() {
            leaves.push(node);
        }
        queue.extend(children);
    }
    Ok(leaves)
}

struct Partitioner<'a> {
    arbor: &'a mut Arbor,
    positions: &'a mut Positions,
    options: &'a PartitionOptions,
    partition: Partition,
}

impl Partitioner<'_> {
    /// Cut one path segment into intervals. The first node starts an interval,
    /// the last node ends one.
    fn walk(&mut self, segment: &[NodeId]) -> DomainResult<()> {
        let target = self.options.target_length;
        let epsilon = LENGTH_EPSILON * target.max(1.0);
        let end = segment[segment.len() - 1];

        let mut interval_start = segment[0];
        let mut previous = segment[0];
        // Distance from interval_start to previous
        let mut walked = 0.0;
        let mut k = 1;

        while k < segment.len() {
            let current = segment[k];
            let step = edge_length(self.positions, previous, current)?;
            let reached = walked + step;

            if (reached - target).abs() <= epsilon {
                self.close(&mut interval_start, current);
                previous = current;
                walked = 0.0;
                k += 1;
                continue;
            }

            if reached < target {
                if current == end {
                    self.close(&mut interval_start, current);
                }
                previous = current;
                walked = reached;
                k += 1;
                continue;
            }

            // The boundary lies on the edge previous -> current
            let overshoot = reached - target;
            let undershoot = (previous != interval_start).then_some(target - walked);
            let (take_previous, best_error) = match undershoot {
                Some(under) if under < overshoot => (true, under),
                Some(under) if under == overshoot && self.options.prefer_smaller_error => {
                    (true, under)
                }
                _ => (false, overshoot),
            };

            if self.options.allow_node_synthesis && best_error > self.options.max_error {
                let id = self.synthesize(previous, current, target - walked, step)?;
                self.close(&mut interval_start, id);
                previous = id;
                walked = 0.0;
            } else if take_previous {
                trace!("boundary at {} undershoots by {}", previous, best_error);
                self.close(&mut interval_start, previous);
                walked = 0.0;
            } else {
                trace!("boundary at {} overshoots by {}", current, best_error);
                self.close(&mut interval_start, current);
                previous = current;
                walked = 0.0;
                k += 1;
            }

            if best_error > self.options.max_error && !self.options.allow_node_synthesis {
                debug!(
                    "boundary error {:.3} exceeds max error {:.3}",
                    best_error, self.options.max_error
                );
            }
        }
        Ok(())
    }

    fn close(&mut self, interval_start: &mut NodeId, end: NodeId) {
        trace!("interval {} -> {}", interval_start, end);
        self.partition.intervals.push(Interval::new(*interval_start, end));
        *interval_start = end;
    }

    /// Create a node on the edge `parent -> child`, `offset` away from `parent`.
    fn synthesize(&mut self, parent: NodeId, child: NodeId, offset: f64, edge: f64) -> DomainResult<NodeId> {
        let from = position_of(self.positions, parent)?;
        let to = position_of(self.positions, child)?;
        let position = from + (to - from) * (offset / edge);

        let id = self.arbor.allocate_placeholder_id();
        self.arbor.insert_between(parent, child, id)?;
        self.positions.insert(id, position);
        self.partition.added_nodes.push(SynthesizedNode {
            id,
            position,
            parent,
            child,
        });
        trace!("synthesized {} between {} and {}", id, parent, child);
        Ok(id)
    }
}
