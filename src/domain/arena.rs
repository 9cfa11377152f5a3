//! Arena-based arbor: the rooted tree of a traced skeleton.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::entities::NodeId;
use crate::domain::error::{DomainError, DomainResult};

/// Tree node in the arena-based arbor.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Treenode id
    pub id: NodeId,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// Arena-based rooted tree with an id index.
///
/// Uses a generational arena for node storage, so `clone()` is a deep copy
/// that shares nothing with the original. Node ids are unique, there is a
/// single root and every node is reachable from it.
#[derive(Debug, Clone)]
pub struct Arbor {
    arena: Arena<TreeNode>,
    index: HashMap<NodeId, Index>,
    root: Option<Index>,
    next_placeholder: NodeId,
}

impl Default for Arbor {
    fn default() -> Self {
        Self::new()
    }
}

impl Arbor {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            index: HashMap::new(),
            root: None,
            next_placeholder: -1,
        }
    }

    /// Build an arbor from `(id, parent)` pairs in any order.
    ///
    /// Fails on duplicate ids, unknown parents, zero or multiple roots and on
    /// nodes not reachable from the root (cycles).
    #[instrument(level = "debug", skip(edges))]
    pub fn from_edges<I>(edges: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (NodeId, Option<NodeId>)>,
    {
        let edges: Vec<(NodeId, Option<NodeId>)> = edges.into_iter().collect();
        let mut arbor = Self::new();

        for &(id, parent) in &edges {
            if arbor.index.contains_key(&id) {
                return Err(DomainError::invalid_arbor(format!("duplicate node {id}")));
            }
            let idx = arbor.arena.insert(TreeNode {
                id,
                parent: None,
                children: Vec::new(),
            });
            arbor.index.insert(id, idx);
            arbor.reserve_placeholder_below(id);
            if parent.is_none() {
                if arbor.root.is_some() {
                    return Err(DomainError::invalid_arbor(format!(
                        "multiple roots, {id} has no parent"
                    )));
                }
                arbor.root = Some(idx);
            }
        }

        for &(id, parent) in &edges {
            let Some(parent_id) = parent else { continue };
            let parent_idx = *arbor.index.get(&parent_id).ok_or_else(|| {
                DomainError::invalid_arbor(format!("node {id} has unknown parent {parent_id}"))
            })?;
            let idx = arbor.index[&id];
            arbor.arena[idx].parent = Some(parent_idx);
            arbor.arena[parent_idx].children.push(idx);
        }

        if !edges.is_empty() {
            if arbor.root.is_none() {
                return Err(DomainError::invalid_arbor("no root node"));
            }
            let reachable = arbor.iter().count();
            if reachable != arbor.len() {
                return Err(DomainError::invalid_arbor(format!(
                    "{} of {} nodes are not reachable from the root",
                    arbor.len() - reachable,
                    arbor.len()
                )));
            }
        }

        Ok(arbor)
    }

    /// Splice a new node `id` into the edge `parent -> child`.
    ///
    /// The new node takes the child's slot in the parent's child list, and the
    /// child (with its whole subtree) is re-parented onto it.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_between(&mut self, parent: NodeId, child: NodeId, id: NodeId) -> DomainResult<()> {
        if self.index.contains_key(&id) {
            return Err(DomainError::invalid_arbor(format!("duplicate node {id}")));
        }
        let parent_idx = self.index_of(parent)?;
        let child_idx = self.index_of(child)?;
        let slot = self.arena[parent_idx]
            .children
            .iter()
            .position(|&c| c == child_idx)
            .ok_or_else(|| {
                DomainError::invalid_arbor(format!("{child} is not a child of {parent}"))
            })?;

        let node_idx = self.arena.insert(TreeNode {
            id,
            parent: Some(parent_idx),
            children: vec![child_idx],
        });
        self.index.insert(id, node_idx);
        self.reserve_placeholder_below(id);
        self.arena[parent_idx].children[slot] = node_idx;
        self.arena[child_idx].parent = Some(node_idx);
        trace!("inserted {} between {} and {}", id, parent, child);
        Ok(())
    }

    /// Hand out the next unused placeholder id (negative).
    pub fn allocate_placeholder_id(&mut self) -> NodeId {
        let id = self.next_placeholder;
        self.next_placeholder -= 1;
        id
    }

    fn reserve_placeholder_below(&mut self, id: NodeId) {
        if id <= self.next_placeholder {
            self.next_placeholder = id - 1;
        }
    }

    fn index_of(&self, id: NodeId) -> DomainResult<Index> {
        self.index
            .get(&id)
            .copied()
            .ok_or(DomainError::UnknownNode(id))
    }

    fn id_of(&self, idx: Index) -> NodeId {
        self.arena[idx].id
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.map(|idx| self.id_of(idx))
    }

    /// Parent of `id`, None for the root.
    pub fn parent(&self, id: NodeId) -> DomainResult<Option<NodeId>> {
        let idx = self.index_of(id)?;
        Ok(self.arena[idx].parent.map(|p| self.id_of(p)))
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> DomainResult<Vec<NodeId>> {
        let idx = self.index_of(id)?;
        Ok(self.arena[idx]
            .children
            .iter()
            .map(|&c| self.id_of(c))
            .collect())
    }

    /// Pre-order traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Post-order traversal from the root.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut depths: HashMap<Index, usize> = HashMap::new();
        for id in self.iter_postorder() {
            let idx = self.index[&id];
            let below = self.arena[idx]
                .children
                .iter()
                .map(|c| depths[c])
                .max()
                .unwrap_or(0);
            depths.insert(idx, below + 1);
        }
        self.root.map(|r| depths[&r]).unwrap_or(0)
    }

    /// All nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|&id| self.arena[self.index[&id]].children.is_empty())
            .collect()
    }

    /// Nodes on the path from `ancestor` down to `node`, both inclusive.
    ///
    /// Returns None if `ancestor` is not an ancestor of (or equal to) `node`.
    pub fn path_from_ancestor(&self, ancestor: NodeId, node: NodeId) -> DomainResult<Option<Vec<NodeId>>> {
        let ancestor_idx = self.index_of(ancestor)?;
        let mut current = Some(self.index_of(node)?);
        let mut path = Vec::new();
        while let Some(idx) = current {
            path.push(self.id_of(idx));
            if idx == ancestor_idx {
                path.reverse();
                return Ok(Some(path));
            }
            current = self.arena[idx].parent;
        }
        Ok(None)
    }
}

pub struct TreeIterator<'a> {
    arbor: &'a Arbor,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arbor: &'a Arbor) -> Self {
        Self {
            arbor,
            stack: arbor.root.into_iter().collect(),
        }
    }
}

impl Iterator for TreeIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = &self.arbor.arena[current_idx];
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children.iter().rev().copied());
        Some(node.id)
    }
}

pub struct PostOrderIterator<'a> {
    arbor: &'a Arbor,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arbor: &'a Arbor) -> Self {
        Self {
            arbor,
            stack: arbor.root.map(|r| (r, false)).into_iter().collect(),
        }
    }
}

impl Iterator for PostOrderIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            let node = &self.arbor.arena[current_idx];
            if visited {
                return Some(node.id);
            }
            self.stack.push((current_idx, true));
            for &child in node.children.iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn y_arbor() -> Arbor {
        // 1 - 2 - 3 - 4
        //          \ - 5
        Arbor::from_edges([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (5, Some(3))]).unwrap()
    }

    #[test]
    fn given_edges_out_of_order_when_building_then_links_parents() {
        let arbor = Arbor::from_edges([(3, Some(2)), (2, Some(1)), (1, None)]).unwrap();
        assert_eq!(arbor.root(), Some(1));
        assert_eq!(arbor.parent(3).unwrap(), Some(2));
        assert_eq!(arbor.children(1).unwrap(), vec![2]);
    }

    #[test]
    fn given_cycle_when_building_then_fails() {
        let result = Arbor::from_edges([(1, None), (2, Some(3)), (3, Some(2))]);
        assert!(matches!(result, Err(DomainError::InvalidArbor { .. })));
    }

    #[test]
    fn given_two_roots_when_building_then_fails() {
        let result = Arbor::from_edges([(1, None), (2, None)]);
        assert!(matches!(result, Err(DomainError::InvalidArbor { .. })));
    }

    #[test]
    fn given_branch_when_traversing_then_orders_pre_and_post() {
        let arbor = y_arbor();
        assert_eq!(arbor.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(arbor.iter_postorder().collect::<Vec<_>>(), vec![4, 5, 3, 2, 1]);
        assert_eq!(arbor.depth(), 4);
        assert_eq!(arbor.leaf_nodes(), vec![4, 5]);
    }

    #[test]
    fn given_insert_between_when_inserting_then_reparents_child() {
        let mut arbor = y_arbor();
        let id = arbor.allocate_placeholder_id();
        arbor.insert_between(3, 5, id).unwrap();
        assert_eq!(arbor.children(3).unwrap(), vec![4, id]);
        assert_eq!(arbor.parent(5).unwrap(), Some(id));
        assert_eq!(arbor.path_from_ancestor(1, 5).unwrap(), Some(vec![1, 2, 3, id, 5]));
    }

    #[test]
    fn given_clone_when_mutating_then_original_unchanged() {
        let original = y_arbor();
        let mut copy = original.clone();
        let id = copy.allocate_placeholder_id();
        copy.insert_between(1, 2, id).unwrap();
        assert!(!original.contains(id));
        assert_eq!(original.parent(2).unwrap(), Some(1));
    }

    #[test]
    fn given_negative_ids_when_allocating_placeholder_then_stays_below() {
        let mut arbor = Arbor::from_edges([(1, None), (-4, Some(1))]).unwrap();
        assert_eq!(arbor.allocate_placeholder_id(), -5);
    }
}
