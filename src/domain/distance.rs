//! Path length measurement along arbor edges.

use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;

use crate::domain::arena::Arbor;
use crate::domain::entities::{NodeId, Position, Positions};
use crate::domain::error::{DomainError, DomainResult};

pub(crate) fn position_of(positions: &Positions, id: NodeId) -> DomainResult<Position> {
    positions
        .get(&id)
        .copied()
        .ok_or(DomainError::MissingPosition(id))
}

/// Euclidean distance between two nodes.
pub fn edge_length(positions: &Positions, a: NodeId, b: NodeId) -> DomainResult<f64> {
    Ok(nalgebra::distance(&position_of(positions, a)?, &position_of(positions, b)?))
}

/// Sum of edge lengths along consecutive nodes of `path`.
pub fn path_length(positions: &Positions, path: &[NodeId]) -> DomainResult<f64> {
    path.iter()
        .tuple_windows()
        .map(|(&a, &b)| edge_length(positions, a, b))
        .sum()
}

/// Cumulative path distance from `start` to every node of its subtree.
///
/// Each child of a branch node continues from the branch node's distance.
pub fn distances_from(arbor: &Arbor, positions: &Positions, start: NodeId) -> DomainResult<BTreeMap<NodeId, f64>> {
    let mut distances = BTreeMap::from([(start, 0.0)]);
    let mut queue = VecDeque::from([(start, 0.0)]);
    while let Some((node, distance)) = queue.pop_front() {
        for child in arbor.children(node)? {
            let child_distance = distance + edge_length(positions, node, child)?;
            distances.insert(child, child_distance);
            queue.push_back((child, child_distance));
        }
    }
    Ok(distances)
}

/// Path distance from `ancestor` down to `node`.
pub fn distance_between(arbor: &Arbor, positions: &Positions, ancestor: NodeId, node: NodeId) -> DomainResult<f64> {
    let path = arbor
        .path_from_ancestor(ancestor, node)?
        .ok_or(DomainError::UnreachableBoundary {
            start: ancestor,
            end: node,
        })?;
    path_length(positions, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> (Arbor, Positions) {
        let arbor = Arbor::from_edges([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(2))]).unwrap();
        let positions = Positions::from([
            (1, Position::new(0.0, 0.0, 0.0)),
            (2, Position::new(3.0, 4.0, 0.0)),
            (3, Position::new(3.0, 4.0, 10.0)),
            (4, Position::new(6.0, 8.0, 0.0)),
        ]);
        (arbor, positions)
    }

    #[test]
    fn given_branch_when_measuring_then_each_child_continues_from_branch() {
        let (arbor, positions) = l_shape();
        let distances = distances_from(&arbor, &positions, 1).unwrap();
        assert_eq!(distances[&2], 5.0);
        assert_eq!(distances[&3], 15.0);
        assert_eq!(distances[&4], 10.0);
    }

    #[test]
    fn given_non_ancestor_when_measuring_then_unreachable() {
        let (arbor, positions) = l_shape();
        let err = distance_between(&arbor, &positions, 3, 4).unwrap_err();
        assert_eq!(err, DomainError::UnreachableBoundary { start: 3, end: 4 });
    }

    #[test]
    fn given_single_node_path_when_measuring_then_zero() {
        let (_, positions) = l_shape();
        assert_eq!(path_length(&positions, &[2]).unwrap(), 0.0);
    }
}
