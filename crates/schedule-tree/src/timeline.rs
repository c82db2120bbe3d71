//! Execution order of statement instances under a schedule.
//!
//! A timestamp is the vector of band coordinates met on the way from the root
//! to a leaf, with the child position inserted at every sequence or set. Two
//! instances execute in the lexicographic order of their timestamps.

use smallvec::SmallVec;

use crate::node::{Node, Schedule};
use crate::statement::StmtId;

pub type Timestamp = SmallVec<[i64; 8]>;

/// One execution of a statement instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledInstance {
    pub stmt: StmtId,
    pub point: Vec<i64>,
    pub timestamp: Timestamp,
}

impl Schedule {
    /// Timestamps of one instance, one per leaf it reaches.
    pub fn timestamps(&self, stmt: StmtId, point: &[i64]) -> Vec<Timestamp> {
        let mut out = Vec::new();
        let mut prefix = Timestamp::new();
        collect(&self.root, stmt, point, &mut prefix, &mut out);
        out
    }

    /// Every execution of every instance, in schedule order.
    ///
    /// An instance reaching no leaf never executes; one reaching several
    /// leaves executes once per leaf.
    pub fn execution_order(&self) -> Vec<ScheduledInstance> {
        let mut order = Vec::new();
        for stmt in self.statements() {
            for point in stmt.domain.points() {
                for timestamp in self.timestamps(stmt.id, &point) {
                    order.push(ScheduledInstance {
                        stmt: stmt.id,
                        point: point.clone(),
                        timestamp,
                    });
                }
            }
        }
        order.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.stmt.cmp(&b.stmt))
                .then_with(|| a.point.cmp(&b.point))
        });
        order
    }
}

fn collect(
    node: &Node,
    stmt: StmtId,
    point: &[i64],
    prefix: &mut Timestamp,
    out: &mut Vec<Timestamp>,
) {
    match node {
        Node::Band { band, child } => {
            let depth = prefix.len();
            prefix.extend(band.members.iter().map(|m| m.eval(stmt, point)));
            collect(child, stmt, point, prefix, out);
            prefix.truncate(depth);
        }
        Node::Mark { child, .. } => collect(child, stmt, point, prefix, out),
        Node::Filter { filter, child } => {
            if filter.contains(stmt, point) {
                collect(child, stmt, point, prefix, out);
            }
        }
        Node::Sequence(children) | Node::Set(children) => {
            for (position, child) in children.iter().enumerate() {
                prefix.push(position as i64);
                collect(child, stmt, point, prefix, out);
                prefix.pop();
            }
        }
        Node::Leaf => out.push(prefix.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::QuasiAffine;
    use crate::domain::{BoxSet, InstanceSet, Interval};
    use crate::node::{Band, BandMember};
    use crate::statement::Statement;

    fn statement(id: u32, extent: i64) -> Statement {
        Statement {
            id: StmtId::new(id),
            name: format!("S{id}"),
            iterators: vec!["i".to_owned()],
            domain: BoxSet::new([Interval::extent(extent)]),
            accesses: Vec::new(),
        }
    }

    #[test]
    fn reversed_band_reverses_order() {
        let s = StmtId::new(0);
        let reversed = crate::affine::AffineExpr::new([-1], 0);
        let root = Node::band(
            Band::new(vec![BandMember::new(true, true).with(s, reversed)]),
            Node::Leaf,
        );
        let schedule = Schedule::new(vec![statement(0, 3)], root);
        let points: Vec<_> = schedule
            .execution_order()
            .into_iter()
            .map(|inst| inst.point[0])
            .collect();
        assert_eq!(points, vec![2, 1, 0]);
    }

    #[test]
    fn sequence_orders_statements() {
        let statements = vec![statement(0, 2), statement(1, 2)];
        let (s0, s1) = (StmtId::new(0), StmtId::new(1));
        let only = |id: StmtId| InstanceSet::of_statements(&statements, [id]);
        let root = Node::Sequence(vec![
            Node::filter(only(s1), Node::Leaf),
            Node::filter(only(s0), Node::Leaf),
        ]);
        let schedule = Schedule::new(statements.clone(), root);
        let order: Vec<_> = schedule
            .execution_order()
            .into_iter()
            .map(|inst| inst.stmt)
            .collect();
        assert_eq!(order, vec![s1, s1, s0, s0]);
        assert_eq!(schedule.timestamps(s0, &[1]).len(), 1);
    }

    #[test]
    fn filtered_out_instances_never_execute() {
        let s = StmtId::new(0);
        let mut half = InstanceSet::empty();
        half.insert(s, BoxSet::new([Interval::new(0, 1)]));
        let root = Node::band(
            Band::new(vec![BandMember::new(true, true).with(s, QuasiAffine::var(1, 0))]),
            Node::Sequence(vec![Node::filter(half, Node::Leaf)]),
        );
        let schedule = Schedule::new(vec![statement(0, 4)], root);
        assert_eq!(schedule.execution_order().len(), 2);
        assert!(schedule.timestamps(s, &[3]).is_empty());
    }
}
