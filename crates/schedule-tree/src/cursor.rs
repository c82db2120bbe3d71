//! Owned cursor into a schedule tree.
//!
//! A [`ScheduleNode`] owns the whole [`Schedule`] together with the path from
//! the root to the node it points at. Navigation and edits consume the cursor
//! and hand back a new one, so a stale handle can never be observed.

use crate::domain::InstanceSet;
use crate::node::{Band, BandMember, Node, NodeKind, Schedule};
use crate::statement::Statement;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleNode {
    schedule: Schedule,
    path: Vec<usize>,
}

impl Schedule {
    /// A cursor at the root of the tree.
    pub fn into_root(self) -> ScheduleNode {
        ScheduleNode {
            schedule: self,
            path: Vec::new(),
        }
    }
}

fn node_at<'a>(root: &'a Node, path: &[usize]) -> &'a Node {
    path.iter()
        .fold(root, |node, &index| &node.children()[index])
}

fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> &'a mut Node {
    path.iter()
        .fold(root, |node, &index| &mut node.children_mut()[index])
}

impl ScheduleNode {
    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn statements(&self) -> &[Statement] {
        self.schedule.statements()
    }

    /// Child indices from the root to this node.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub(crate) fn at_path(mut self, path: Vec<usize>) -> Self {
        self.path = path;
        debug_assert!(self.is_valid_path(), "cursor moved off the tree");
        self
    }

    fn is_valid_path(&self) -> bool {
        let mut node = &self.schedule.root;
        for &index in &self.path {
            match node.children().get(index) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }

    pub fn node(&self) -> &Node {
        node_at(&self.schedule.root, &self.path)
    }

    pub(crate) fn node_mut(&mut self) -> &mut Node {
        node_at_mut(&mut self.schedule.root, &self.path)
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    pub fn band(&self) -> Option<&Band> {
        self.node().as_band()
    }

    pub fn n_children(&self) -> usize {
        self.node().children().len()
    }

    pub fn has_parent(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn child(mut self, index: usize) -> Self {
        let n = self.n_children();
        assert!(index < n, "child {index} of a {} with {n} children", self.kind());
        self.path.push(index);
        self
    }

    pub fn parent(mut self) -> Self {
        assert!(self.path.pop().is_some(), "root has no parent");
        self
    }

    pub fn root(mut self) -> Self {
        self.path.clear();
        self
    }

    /// Whether the only child is a leaf.
    pub fn has_leaf_child(&self) -> bool {
        matches!(self.node().children(), [child] if child.is_leaf())
    }

    /// Statement instances reaching this node through the filters of its
    /// ancestors.
    pub fn domain(&self) -> InstanceSet {
        let mut domain = self.schedule.domain();
        let mut node = &self.schedule.root;
        for &index in &self.path {
            if let Node::Filter { filter, .. } = node {
                domain = domain.intersect(filter);
            }
            node = &node.children()[index];
        }
        domain
    }

    /// Band members of all ancestors, outermost first.
    pub fn prefix_members(&self) -> Vec<&BandMember> {
        let mut members = Vec::new();
        let mut node = &self.schedule.root;
        for &index in &self.path {
            if let Node::Band { band, .. } = node {
                members.extend(band.members.iter());
            }
            node = &node.children()[index];
        }
        members
    }

    /// Replace the node under the cursor with `f(node)`.
    pub fn replace_with(mut self, f: impl FnOnce(Node) -> Node) -> Self {
        let slot = self.node_mut();
        let old = std::mem::replace(slot, Node::Leaf);
        *slot = f(old);
        self
    }
}
