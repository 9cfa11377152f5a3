//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;

use crate::domain::arena::Arbor;
use crate::domain::error::{DomainError, DomainResult};

/// Treenode identifier. Persisted nodes are positive, placeholders for
/// synthesized nodes are negative.
pub type NodeId = i64;

/// Location of a node in project space (nm).
pub type Position = Point3<f64>;

/// Node locations, keyed by node id.
pub type Positions = BTreeMap<NodeId, Position>;

/// A traced skeleton: arbor topology plus node locations.
///
/// This is the unit callers cache. Anything that mutates it (interpolation,
/// boundary node synthesis) must work on [`Skeleton::working_copy`].
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub skeleton_id: Option<i64>,
    pub arbor: Arbor,
    pub positions: Positions,
}

impl Skeleton {
    /// Combine an arbor with its positions. Every arbor node needs a position.
    pub fn new(skeleton_id: Option<i64>, arbor: Arbor, positions: Positions) -> DomainResult<Self> {
        if let Some(missing) = arbor.iter().find(|id| !positions.contains_key(id)) {
            return Err(DomainError::MissingPosition(missing));
        }
        Ok(Self {
            skeleton_id,
            arbor,
            positions,
        })
    }

    /// Build a skeleton from `(id, parent, position)` rows.
    pub fn from_nodes<I>(skeleton_id: Option<i64>, nodes: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (NodeId, Option<NodeId>, Position)>,
    {
        let mut edges = Vec::new();
        let mut positions = Positions::new();
        for (id, parent, position) in nodes {
            edges.push((id, parent));
            positions.insert(id, position);
        }
        let arbor = Arbor::from_edges(edges)?;
        Self::new(skeleton_id, arbor, positions)
    }

    /// Deep copy for speculative work; the original stays untouched.
    pub fn working_copy(&self) -> Self {
        self.clone()
    }
}

/// A sampled region of an arbor: everything between `start` and the `ends`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub start: NodeId,
    pub ends: BTreeSet<NodeId>,
}

impl Domain {
    pub fn new(start: NodeId, ends: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            start,
            ends: ends.into_iter().collect(),
        }
    }

    /// Domain spanning the whole arbor: root to every leaf.
    pub fn covering(arbor: &Arbor) -> DomainResult<Self> {
        let root = arbor
            .root()
            .ok_or_else(|| DomainError::invalid_domain("arbor is empty"))?;
        Ok(Self::new(root, arbor.leaf_nodes()))
    }
}

/// A contiguous path segment of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: NodeId,
    pub end: NodeId,
}

impl Interval {
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }
}

/// A node created to let an interval boundary land on the target length.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedNode {
    /// Placeholder id (negative) until the server assigns a real one
    pub id: NodeId,
    pub position: Position,
    /// Node the new node was attached to
    pub parent: NodeId,
    /// Node that was re-parented onto the new node
    pub child: NodeId,
}

/// Tuning of a partitioning run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionOptions {
    /// Desired path length of each interval (nm)
    pub target_length: f64,
    /// Largest boundary error accepted before a new node is synthesized (nm)
    pub max_error: f64,
    /// On equal error, end the interval early rather than late
    pub prefer_smaller_error: bool,
    /// Whether boundary nodes may be created on edges
    pub allow_node_synthesis: bool,
}

impl PartitionOptions {
    pub fn new(target_length: f64, max_error: f64) -> Self {
        Self {
            target_length,
            max_error,
            prefer_smaller_error: true,
            allow_node_synthesis: false,
        }
    }

    pub fn with_prefer_smaller_error(mut self, prefer: bool) -> Self {
        self.prefer_smaller_error = prefer;
        self
    }

    pub fn with_node_synthesis(mut self, allow: bool) -> Self {
        self.allow_node_synthesis = allow;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !self.target_length.is_finite() || self.target_length <= 0.0 {
            return Err(DomainError::invalid_configuration(format!(
                "interval length must be positive, got {}",
                self.target_length
            )));
        }
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(DomainError::invalid_configuration(format!(
                "interval error must not be negative, got {}",
                self.max_error
            )));
        }
        Ok(())
    }
}

/// Result of partitioning a domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Intervals in discovery order, domain start first
    pub intervals: Vec<Interval>,
    /// Nodes created during partitioning, in creation order
    pub added_nodes: Vec<SynthesizedNode>,
}

impl Partition {
    /// All interval start and end nodes.
    pub fn boundaries(&self) -> BTreeSet<NodeId> {
        self.intervals
            .iter()
            .flat_map(|interval| [interval.start, interval.end])
            .collect()
    }

    pub fn is_synthesized(&self, id: NodeId) -> bool {
        self.added_nodes.iter().any(|node| node.id == id)
    }
}

/// Per-axis coordinates of sections whose node locations are unreliable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolatableSections {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl InterpolatableSections {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self { x, y, z }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }

    /// Section values for one axis (0 = X, 1 = Y, 2 = Z).
    pub fn axis(&self, axis: usize) -> &[f64] {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_non_positive_length_when_validating_then_rejects() {
        assert!(PartitionOptions::new(0.0, 1.0).validate().is_err());
        assert!(PartitionOptions::new(-5.0, 1.0).validate().is_err());
        assert!(PartitionOptions::new(f64::NAN, 1.0).validate().is_err());
    }

    #[test]
    fn given_negative_error_when_validating_then_rejects() {
        let err = PartitionOptions::new(10.0, -1.0).validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration { .. }));
    }

    #[test]
    fn given_missing_position_when_creating_skeleton_then_fails() {
        let arbor = Arbor::from_edges([(1, None), (2, Some(1))]).unwrap();
        let mut positions = Positions::new();
        positions.insert(1, Position::origin());
        let err = Skeleton::new(None, arbor, positions).unwrap_err();
        assert_eq!(err, DomainError::MissingPosition(2));
    }
}
