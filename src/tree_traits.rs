/*
Workaround for error: https://doc.rust-lang.org/error_codes/E0116.html
Cannot define inherent `impl` for a type outside of the crate where the type is defined

define a trait that has the desired associated functions/types/constants and implement the trait for the type in question
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Arbor, NodeId, Positions, Skeleton};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;

    /// One-line header: node count and depth.
    fn tree_summary(&self) -> String;
}

impl TreeNodeConvert for Arbor {
    fn to_tree_string(&self) -> Tree<String> {
        render(self, None)
    }

    fn tree_summary(&self) -> String {
        format!("{} nodes, depth {}", self.len(), self.depth())
    }
}

impl TreeNodeConvert for Skeleton {
    #[instrument(level = "debug", skip(self), fields(nodes = self.arbor.len()))]
    fn to_tree_string(&self) -> Tree<String> {
        render(&self.arbor, Some(&self.positions))
    }

    fn tree_summary(&self) -> String {
        match self.skeleton_id {
            Some(id) => format!("skeleton {}: {}", id, self.arbor.tree_summary()),
            None => self.arbor.tree_summary(),
        }
    }
}

fn label(id: NodeId, positions: Option<&Positions>) -> String {
    match positions.and_then(|p| p.get(&id)) {
        Some(p) => format!("{} ({:.1}, {:.1}, {:.1})", id, p.x, p.y, p.z),
        None => id.to_string(),
    }
}

fn render(arbor: &Arbor, positions: Option<&Positions>) -> Tree<String> {
    let Some(root) = arbor.root() else {
        return Tree::new("Empty tree".to_string());
    };

    fn build_tree(arbor: &Arbor, positions: Option<&Positions>, id: NodeId, parent_tree: &mut Tree<String>) {
        for child in arbor.children(id).unwrap_or_default() {
            let mut child_tree = Tree::new(label(child, positions));
            build_tree(arbor, positions, child, &mut child_tree);
            parent_tree.push(child_tree);
        }
    }

    let mut tree = Tree::new(label(root, positions));
    build_tree(arbor, positions, root, &mut tree);
    tree
}
