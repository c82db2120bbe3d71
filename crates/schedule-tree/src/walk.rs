//! Top-down rewriting traversal over schedule nodes.
//!
//! [`ScheduleNode::map_descendants`] visits a subtree in pre-order and hands
//! each node to a callback that owns it for the duration of the call. The
//! callback returns the (possibly rewritten) node and whether to descend into
//! its children.
//!
//! ```ignore
//! let node = root.map_descendants(|node| {
//!     if node.kind() == NodeKind::Mark {
//!         (node, WalkAction::Skip)
//!     } else {
//!         (node, WalkAction::Advance)
//!     }
//! });
//! ```

use crate::cursor::ScheduleNode;

/// Controls whether to descend into children during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into the children.
    Advance,
    /// Skip the children of the current node.
    Skip,
}

impl ScheduleNode {
    /// Rewrite this node and its descendants top-down.
    ///
    /// After each callback the cursor is moved back to the visited position,
    /// so a callback may leave it anywhere inside the subtree it rewrote. The
    /// callback must not edit ancestors of the visited node.
    pub fn map_descendants(
        self,
        mut f: impl FnMut(ScheduleNode) -> (ScheduleNode, WalkAction),
    ) -> ScheduleNode {
        map_node_internal(self, &mut f)
    }
}

// Internal helper to avoid recursion limit issues with impl FnMut
fn map_node_internal(
    node: ScheduleNode,
    f: &mut dyn FnMut(ScheduleNode) -> (ScheduleNode, WalkAction),
) -> ScheduleNode {
    let position = node.path().to_vec();
    let (node, action) = f(node);
    let mut node = node.at_path(position);
    if action == WalkAction::Advance {
        for index in 0..node.n_children() {
            node = map_node_internal(node.child(index), f).parent();
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind, Schedule};

    fn nested_marks() -> ScheduleNode {
        let root = Node::mark("a", Node::mark("b", Node::mark("c", Node::Leaf)));
        Schedule::new(Vec::new(), root).into_root()
    }

    #[test]
    fn visits_in_pre_order() {
        let mut tags = Vec::new();
        let node = nested_marks().map_descendants(|node| {
            if let Some(tag) = node.node().as_mark() {
                tags.push(tag.to_owned());
            }
            (node, WalkAction::Advance)
        });
        assert_eq!(tags, vec!["a", "b", "c"]);
        assert!(!node.has_parent());
    }

    #[test]
    fn skip_stops_descent() {
        let mut kinds = Vec::new();
        let _ = nested_marks().map_descendants(|node| {
            kinds.push(node.kind());
            let action = if node.node().as_mark() == Some("b") {
                WalkAction::Skip
            } else {
                WalkAction::Advance
            };
            (node, action)
        });
        assert_eq!(kinds, vec![NodeKind::Mark, NodeKind::Mark]);
    }

    #[test]
    fn rewrite_is_not_revisited() {
        let mut visits = 0;
        let node = nested_marks().map_descendants(|node| {
            visits += 1;
            if node.node().as_mark() == Some("b") {
                let node = node.insert_mark("inserted");
                return (node, WalkAction::Skip);
            }
            (node, WalkAction::Advance)
        });
        assert_eq!(visits, 2);
        let schedule = node.into_schedule();
        let inner = &schedule.root_node().children()[0];
        assert_eq!(inner.as_mark(), Some("inserted"));
    }
}
