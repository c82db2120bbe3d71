//! Structural edits on schedule trees.
//!
//! Every edit consumes the cursor and returns one positioned as documented on
//! the method. Edits only touch the subtree under the cursor. Applying an edit
//! to a node of the wrong kind is a caller bug and panics.

use std::collections::BTreeSet;

use crate::domain::InstanceSet;
use crate::node::{AstOption, Band, BandMember, Node, NodeKind};
use crate::statement::StmtId;
use crate::walk::WalkAction;
use crate::ScheduleNode;

impl ScheduleNode {
    fn expect_band(&self, edit: &str) -> &Band {
        match self.band() {
            Some(band) => band,
            None => panic!("{edit} applied to a {} node", self.kind()),
        }
    }

    fn take_band(self, edit: &str) -> (Self, Band) {
        self.expect_band(edit);
        let mut taken = None;
        let node = self.replace_with(|node| match node {
            Node::Band { band, child } => {
                taken = Some(band);
                *child
            }
            other => other,
        });
        let Some(band) = taken else {
            unreachable!("{edit}: band vanished")
        };
        (node, band)
    }

    /// Split a band into an outer band with the first `pos` members and an
    /// inner band with the rest. The cursor stays on the outer band.
    pub fn band_split(self, pos: usize) -> Self {
        let n = self.expect_band("band_split").n_member();
        assert!(
            0 < pos && pos < n,
            "cannot split a band of {n} members at {pos}"
        );
        let (node, mut band) = self.take_band("band_split");
        let inner_members = band.members.split_off(pos);
        let inner = Band {
            members: inner_members,
            ast_option: band.ast_option,
        };
        let outer = Band::new(band.members);
        node.replace_with(|child| Node::band(outer, Node::band(inner, child)))
    }

    /// Tile every member of a band.
    ///
    /// Member `e` with size `s` becomes the tile coordinate `floor(e/s)` in a
    /// new outer band and the point coordinate `e mod s` in the inner band.
    /// The cursor stays on the tile band.
    pub fn band_tile(self, sizes: &[i64]) -> Self {
        let n = self.expect_band("band_tile").n_member();
        assert_eq!(sizes.len(), n, "one tile size per band member");
        assert!(
            sizes.iter().all(|&s| s > 0),
            "tile sizes must be positive: {sizes:?}"
        );
        let (node, band) = self.take_band("band_tile");
        let tile = Band::new(
            band.members
                .iter()
                .zip(sizes)
                .map(|(member, &size)| member.map_exprs(|e| e.clone().floor_div(size)))
                .collect(),
        );
        let point = Band {
            members: band
                .members
                .iter()
                .zip(sizes)
                .map(|(member, &size)| member.map_exprs(|e| e.clone().modulo(size)))
                .collect(),
            ast_option: band.ast_option,
        };
        node.replace_with(|child| Node::band(tile, Node::band(point, child)))
    }

    /// Move a band down to just above every leaf of its subtree.
    ///
    /// Each copy only keeps the schedules of the statements that reach its
    /// leaf. The cursor stays at the same position, now holding the former
    /// child.
    pub fn band_sink(self) -> Self {
        self.sink(None)
    }

    /// Like [`ScheduleNode::band_sink`], with a mark above every sunk copy.
    pub fn band_sink_marked(self, tag: &str) -> Self {
        self.sink(Some(tag))
    }

    fn sink(self, tag: Option<&str>) -> Self {
        let (node, band) = self.take_band("band_sink");
        node.map_descendants(|node| {
            if !node.node().is_leaf() {
                return (node, WalkAction::Advance);
            }
            let reaching: BTreeSet<StmtId> = node.domain().statements().collect();
            let local = Band {
                members: band
                    .members
                    .iter()
                    .map(|member| BandMember {
                        schedule: member
                            .schedule
                            .iter()
                            .filter(|(stmt, _)| reaching.contains(stmt))
                            .map(|(stmt, expr)| (*stmt, expr.clone()))
                            .collect(),
                        permutable: member.permutable,
                        coincident: member.coincident,
                    })
                    .collect(),
                ast_option: band.ast_option,
            };
            let node = node.replace_with(|leaf| {
                let sunk = Node::band(local, leaf);
                match tag {
                    Some(tag) => Node::mark(tag, sunk),
                    None => sunk,
                }
            });
            (node, WalkAction::Skip)
        })
    }

    /// Insert a mark above the current node; the cursor moves to the mark.
    pub fn insert_mark(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.replace_with(|node| Node::mark(tag, node))
    }

    pub fn band_set_ast_option(mut self, option: AstOption) -> Self {
        match self.node_mut() {
            Node::Band { band, .. } => band.ast_option = option,
            other => panic!("band_set_ast_option applied to a {} node", other.kind()),
        }
        self
    }

    /// Separate the instances in `isolated` from the rest.
    ///
    /// The subtree is duplicated under a sequence of two filters: the
    /// instances of this node's domain inside `isolated`, then the remaining
    /// ones. Both filters are disjoint and together cover the domain. When
    /// either side is empty the tree is left unchanged. The cursor stays at
    /// the same position.
    pub fn isolate(self, isolated: &InstanceSet) -> Self {
        let domain = self.domain();
        let inside = domain.intersect(isolated);
        let outside = domain.subtract(&inside);
        if inside.is_empty() || outside.is_empty() {
            return self;
        }
        self.replace_with(|node| {
            Node::Sequence(vec![
                Node::filter(inside, node.clone()),
                Node::filter(outside, node),
            ])
        })
    }

    /// Whether [`ScheduleNode::isolate`] produced a two-way split here.
    pub fn is_isolation_split(&self) -> bool {
        self.kind() == NodeKind::Sequence
            && self.n_children() == 2
            && self
                .node()
                .children()
                .iter()
                .all(|c| c.kind() == NodeKind::Filter)
    }
}
