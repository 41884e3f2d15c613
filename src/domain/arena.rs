//! Arena-backed organisation tree.

use generational_arena::{Arena, Index};
use std::fmt;
use termtree::Tree;
use tracing::{instrument, warn};

/// Deepest level shown by `TreeArena::to_tree_string`.
pub const MAX_DISPLAY_DEPTH: usize = 64;

/// Data payload for tree nodes representing employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Identity of the employee (e.g. the email address)
    pub identity: String,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Employee data for this node
    pub data: NodeData,
    /// Index of the manager node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of direct reports, in input order
    pub children: Vec<Index>,
}

/// Arena-based tree holding one organisation hierarchy.
///
/// Nodes own their position through indices, so every node has exactly one
/// parent by construction.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert the root node, replacing any previous root reference.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_root(&mut self, data: NodeData) -> Index {
        let idx = self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.root = Some(idx);
        idx
    }

    /// Insert a node as the last child of `parent`.
    ///
    /// Returns None without inserting anything if `parent` is not a live index.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child(&mut self, data: NodeData, parent: Index) -> Option<Index> {
        if !self.arena.contains(parent) {
            return None;
        }
        let idx = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.arena.get_mut(parent)?.children.push(idx);
        Some(idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.root.and_then(|idx| self.get_node(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Direct reports of `idx`, in insertion order.
    pub fn children_of(&self, idx: Index) -> impl Iterator<Item = (Index, &TreeNode)> + '_ {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&child| self.get_node(child).map(|node| (child, node)))
    }

    /// Find a node by identity (pre-order, first match).
    pub fn find(&self, identity: &str) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.data.identity == identity)
            .map(|(idx, _)| idx)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels, 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        // Post-order sees every child before its parent.
        let mut depths = std::collections::HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let below = node
                .children
                .iter()
                .filter_map(|child| depths.get(child))
                .max()
                .copied()
                .unwrap_or(0);
            depths.insert(idx, below + 1);
        }
        self.root
            .and_then(|root| depths.get(&root).copied())
            .unwrap_or(0)
    }

    /// Identities of all employees without direct reports, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.identity.clone())
            .collect()
    }

    /// Render the hierarchy for terminal display.
    ///
    /// Levels below `MAX_DISPLAY_DEPTH` are collapsed into a single
    /// "… N more" line under the last shown manager.
    pub fn to_tree_string(&self) -> Tree<String> {
        match self.root_node() {
            Some(root) => {
                let mut tree = Tree::new(root.data.identity.clone());
                if let Some(root_idx) = self.root {
                    self.push_leaves(root_idx, &mut tree, 1);
                }
                tree
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }

    fn push_leaves(&self, idx: Index, parent_tree: &mut Tree<String>, level: usize) {
        if level >= MAX_DISPLAY_DEPTH {
            let hidden = self.count_below(idx);
            if hidden > 0 {
                warn!("display truncated at depth {}, {} employees hidden", level, hidden);
                parent_tree.push(Tree::new(format!("… {hidden} more")));
            }
            return;
        }
        for (child_idx, child) in self.children_of(idx) {
            let mut child_tree = Tree::new(child.data.identity.clone());
            self.push_leaves(child_idx, &mut child_tree, level + 1);
            parent_tree.push(child_tree);
        }
    }

    /// Number of nodes strictly below `idx`.
    fn count_below(&self, idx: Index) -> usize {
        let mut count = 0;
        let mut stack: Vec<Index> = self.children_of(idx).map(|(child, _)| child).collect();
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(self.children_of(current).map(|(child, _)| child));
        }
        count
    }
}

/// Pre-order traversal, children left to right.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(identity: &str) -> NodeData {
        NodeData {
            identity: identity.to_string(),
        }
    }

    fn sample() -> TreeArena {
        // a -> (b -> d), c
        let mut tree = TreeArena::new();
        let a = tree.insert_root(data("a"));
        let b = tree.insert_child(data("b"), a).unwrap();
        tree.insert_child(data("c"), a).unwrap();
        tree.insert_child(data("d"), b).unwrap();
        tree
    }

    #[test]
    fn given_empty_tree_when_querying_then_reports_nothing() {
        let tree = TreeArena::new();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.leaf_nodes().is_empty());
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.to_tree_string().to_string().trim(), "Empty tree");
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_is_left_to_right() {
        let tree = sample();
        let order: Vec<_> = tree.iter().map(|(_, n)| n.data.identity.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn given_tree_when_iterating_postorder_then_children_come_first() {
        let tree = sample();
        let order: Vec<_> = tree
            .iter_postorder()
            .map(|(_, n)| n.data.identity.as_str())
            .collect();
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn given_tree_when_measuring_then_depth_and_leaves_match() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_nodes(), vec!["d".to_string(), "c".to_string()]);
    }

    #[test]
    fn given_stale_parent_when_inserting_child_then_nothing_is_inserted() {
        let mut other = TreeArena::new();
        let foreign = other.insert_root(data("x"));
        other.insert_child(data("y"), foreign).unwrap();

        let mut tree = TreeArena::new();
        // Index 1 does not exist in a single-node arena.
        tree.insert_root(data("a"));
        let stale = other.find("y").unwrap();
        assert!(tree.insert_child(data("z"), stale).is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_tree_when_finding_then_returns_matching_node() {
        let tree = sample();
        let d = tree.find("d").unwrap();
        let node = tree.get_node(d).unwrap();
        let parent = tree.get_node(node.parent.unwrap()).unwrap();
        assert_eq!(parent.data.identity, "b");
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn given_tree_when_rendering_then_nests_reports() {
        let rendered = sample().to_tree_string().to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "a");
        assert!(lines[1].ends_with("b"));
        assert!(lines[2].ends_with("d"));
        assert!(lines[3].ends_with("c"));
    }

    #[test]
    fn given_chain_deeper_than_display_limit_when_rendering_then_collapses_rest() {
        let mut tree = TreeArena::new();
        let mut manager = tree.insert_root(data("e0"));
        for i in 1..(MAX_DISPLAY_DEPTH + 10) {
            manager = tree.insert_child(data(&format!("e{i}")), manager).unwrap();
        }

        let rendered = tree.to_tree_string().to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines.len(), MAX_DISPLAY_DEPTH + 1);
        assert!(lines[MAX_DISPLAY_DEPTH - 1].ends_with(&format!("e{}", MAX_DISPLAY_DEPTH - 1)));
        assert!(lines[MAX_DISPLAY_DEPTH].ends_with("… 10 more"));
    }
}
