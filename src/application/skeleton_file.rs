//! JSON exchange formats: skeletons in, partitions out.
//!
//! A skeleton file lists one row per treenode,
//! `[id, parent_id | null, x, y, z]`:
//!
//! ```json
//! {"skeleton_id": 17, "nodes": [[1, null, 0, 0, 0], [2, 1, 0, 0, 40]]}
//! ```
//!
//! A partition is written in the shape the interval `add-all` endpoint takes:
//! interval pairs plus the nodes that have to be created first.

use serde::{Deserialize, Serialize};

use crate::domain::distance::position_of;
use crate::domain::{DomainResult, NodeId, Partition, Position, Skeleton, SynthesizedNode};

/// One treenode row: id, parent, x, y, z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRow(pub NodeId, pub Option<NodeId>, pub f64, pub f64, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFile {
    #[serde(default)]
    pub skeleton_id: Option<i64>,
    pub nodes: Vec<NodeRow>,
}

impl SkeletonFile {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn into_skeleton(self) -> DomainResult<Skeleton> {
        Skeleton::from_nodes(
            self.skeleton_id,
            self.nodes
                .into_iter()
                .map(|NodeRow(id, parent, x, y, z)| (id, parent, Position::new(x, y, z))),
        )
    }

    /// Rows in pre-order, so parents always precede their children.
    pub fn from_skeleton(skeleton: &Skeleton) -> DomainResult<Self> {
        let mut nodes = Vec::with_capacity(skeleton.arbor.len());
        for id in skeleton.arbor.iter() {
            let parent = skeleton.arbor.parent(id)?;
            let p = position_of(&skeleton.positions, id)?;
            nodes.push(NodeRow(id, parent, p.x, p.y, p.z));
        }
        Ok(Self {
            skeleton_id: skeleton.skeleton_id,
            nodes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedNodePayload {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub parent_id: NodeId,
    pub child_id: NodeId,
}

impl From<&SynthesizedNode> for AddedNodePayload {
    fn from(node: &SynthesizedNode) -> Self {
        Self {
            id: node.id,
            x: node.position.x,
            y: node.position.y,
            z: node.position.z,
            parent_id: node.parent,
            child_id: node.child,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionPayload {
    pub intervals: Vec<[NodeId; 2]>,
    pub added_nodes: Vec<AddedNodePayload>,
}

impl From<&Partition> for PartitionPayload {
    fn from(partition: &Partition) -> Self {
        Self {
            intervals: partition
                .intervals
                .iter()
                .map(|interval| [interval.start, interval.end])
                .collect(),
            added_nodes: partition.added_nodes.iter().map(Into::into).collect(),
        }
    }
}

impl PartitionPayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
