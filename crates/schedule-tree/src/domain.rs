//! Integer sets: rectangular iteration domains and unions of them.

use std::collections::BTreeMap;
use std::fmt;

use crate::affine::iterator_name;
use crate::statement::{Statement, StmtId};

/// Inclusive integer interval `lo..=hi`; empty when `lo > hi`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    pub lo: i64,
    pub hi: i64,
}

impl Interval {
    pub const fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    /// `0..=extent-1`.
    pub const fn extent(extent: i64) -> Self {
        Self::new(0, extent - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Number of values, saturating at `u64::MAX`.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.hi.abs_diff(self.lo).saturating_add(1)
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }
}

/// A rectangular set of integer points, one interval per iterator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoxSet {
    bounds: Vec<Interval>,
}

impl BoxSet {
    pub fn new(bounds: impl IntoIterator<Item = Interval>) -> Self {
        Self {
            bounds: bounds.into_iter().collect(),
        }
    }

    pub fn dims(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[Interval] {
        &self.bounds
    }

    pub fn bound(&self, dim: usize) -> Interval {
        self.bounds[dim]
    }

    /// Replace the interval of one dimension.
    pub fn with_bound(mut self, dim: usize, interval: Interval) -> Self {
        self.bounds[dim] = interval;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.iter().any(Interval::is_empty)
    }

    /// Number of points, saturating at `u128::MAX`; zero-dimensional boxes
    /// hold one point.
    pub fn card(&self) -> u128 {
        if self.is_empty() {
            return 0;
        }
        self.bounds
            .iter()
            .fold(1u128, |card, b| card.saturating_mul(u128::from(b.len())))
    }

    pub fn contains(&self, point: &[i64]) -> bool {
        point.len() == self.bounds.len()
            && self.bounds.iter().zip(point).all(|(b, x)| b.contains(*x))
    }

    pub fn intersect(&self, other: &BoxSet) -> BoxSet {
        debug_assert_eq!(self.dims(), other.dims());
        BoxSet::new(
            self.bounds
                .iter()
                .zip(&other.bounds)
                .map(|(a, b)| a.intersect(b)),
        )
    }

    /// `self \ other` as disjoint boxes.
    ///
    /// Peels one slab below and one above `other` per dimension, narrowing the
    /// remaining core each time.
    pub fn subtract(&self, other: &BoxSet) -> Vec<BoxSet> {
        let overlap = self.intersect(other);
        if overlap.is_empty() {
            return if self.is_empty() {
                Vec::new()
            } else {
                vec![self.clone()]
            };
        }
        let mut pieces = Vec::new();
        let mut core = self.clone();
        for dim in 0..self.dims() {
            let cut = overlap.bounds[dim];
            let span = core.bounds[dim];
            let below = Interval::new(span.lo, cut.lo - 1);
            let above = Interval::new(cut.hi + 1, span.hi);
            if !below.is_empty() {
                pieces.push(core.clone().with_bound(dim, below));
            }
            if !above.is_empty() {
                pieces.push(core.clone().with_bound(dim, above));
            }
            core.bounds[dim] = cut;
        }
        pieces
    }

    /// All points in lexicographic order.
    pub fn points(&self) -> BoxPoints<'_> {
        BoxPoints {
            set: self,
            next: if self.is_empty() {
                None
            } else {
                Some(self.bounds.iter().map(|b| b.lo).collect())
            },
        }
    }

    pub fn display<'a>(&'a self, names: &'a [String]) -> impl fmt::Display + 'a {
        DisplayBox { set: self, names }
    }
}

/// Iterator over the points of a [`BoxSet`].
pub struct BoxPoints<'a> {
    set: &'a BoxSet,
    next: Option<Vec<i64>>,
}

impl Iterator for BoxPoints<'_> {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        let mut dim = succ.len();
        let advanced = loop {
            if dim == 0 {
                break false;
            }
            dim -= 1;
            if succ[dim] < self.set.bounds[dim].hi {
                succ[dim] += 1;
                break true;
            }
            succ[dim] = self.set.bounds[dim].lo;
        };
        if advanced {
            self.next = Some(succ);
        }
        Some(current)
    }
}

struct DisplayBox<'a> {
    set: &'a BoxSet,
    names: &'a [String],
}

impl fmt::Display for DisplayBox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dim, bound) in self.set.bounds.iter().enumerate() {
            if dim > 0 {
                write!(f, " and ")?;
            }
            let name = iterator_name(self.names, dim);
            write!(f, "{} <= {name} <= {}", bound.lo, bound.hi)?;
        }
        Ok(())
    }
}

/// A set of statement instances: per statement, a union of disjoint boxes.
///
/// Statements absent from the map have no instances in the set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstanceSet {
    pieces: BTreeMap<StmtId, Vec<BoxSet>>,
}

impl InstanceSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every instance of every statement.
    pub fn universe<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> Self {
        let mut set = Self::empty();
        for stmt in statements {
            set.insert(stmt.id, stmt.domain.clone());
        }
        set
    }

    /// Every instance of the given statements.
    pub fn of_statements(statements: &[Statement], ids: impl IntoIterator<Item = StmtId>) -> Self {
        let mut set = Self::empty();
        for id in ids {
            if let Some(stmt) = statements.get(id.index()) {
                set.insert(id, stmt.domain.clone());
            }
        }
        set
    }

    /// Add a box; the caller keeps pieces of one statement disjoint.
    pub fn insert(&mut self, stmt: StmtId, piece: BoxSet) {
        if piece.is_empty() {
            return;
        }
        self.pieces.entry(stmt).or_default().push(piece);
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.values().all(|boxes| boxes.iter().all(BoxSet::is_empty))
    }

    pub fn statements(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.pieces
            .iter()
            .filter(|(_, boxes)| boxes.iter().any(|b| !b.is_empty()))
            .map(|(id, _)| *id)
    }

    pub fn pieces(&self, stmt: StmtId) -> &[BoxSet] {
        self.pieces.get(&stmt).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (StmtId, &BoxSet)> + '_ {
        self.pieces
            .iter()
            .flat_map(|(id, boxes)| boxes.iter().map(move |b| (*id, b)))
    }

    pub fn contains(&self, stmt: StmtId, point: &[i64]) -> bool {
        self.pieces(stmt).iter().any(|b| b.contains(point))
    }

    /// Number of instances, saturating at `u128::MAX`.
    pub fn card(&self) -> u128 {
        self.pieces
            .values()
            .flatten()
            .fold(0u128, |card, piece| card.saturating_add(piece.card()))
    }

    pub fn intersect(&self, other: &InstanceSet) -> InstanceSet {
        let mut result = InstanceSet::empty();
        for (stmt, boxes) in &self.pieces {
            for a in boxes {
                for b in other.pieces(*stmt) {
                    result.insert(*stmt, a.intersect(b));
                }
            }
        }
        result
    }

    pub fn subtract(&self, other: &InstanceSet) -> InstanceSet {
        let mut result = InstanceSet::empty();
        for (stmt, boxes) in &self.pieces {
            for a in boxes {
                let mut remaining = vec![a.clone()];
                for b in other.pieces(*stmt) {
                    remaining = remaining.iter().flat_map(|r| r.subtract(b)).collect();
                }
                for piece in remaining {
                    result.insert(*stmt, piece);
                }
            }
        }
        result
    }

    pub fn union(mut self, other: InstanceSet) -> InstanceSet {
        for (stmt, boxes) in other.pieces {
            for piece in boxes {
                self.insert(stmt, piece);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: i64, hi: i64) -> BoxSet {
        BoxSet::new([Interval::new(lo, hi), Interval::new(lo, hi)])
    }

    #[test]
    fn points_are_lexicographic() {
        let set = BoxSet::new([Interval::new(0, 1), Interval::new(5, 6)]);
        let points: Vec<_> = set.points().collect();
        assert_eq!(
            points,
            vec![vec![0, 5], vec![0, 6], vec![1, 5], vec![1, 6]]
        );
        assert_eq!(set.card(), 4);
    }

    #[test]
    fn empty_box_has_no_points() {
        let set = BoxSet::new([Interval::new(0, 3), Interval::new(2, 1)]);
        assert!(set.is_empty());
        assert_eq!(set.points().count(), 0);
        assert_eq!(set.card(), 0);
    }

    #[test]
    fn huge_boxes_saturate() {
        assert_eq!(Interval::new(i64::MIN, i64::MAX).len(), u64::MAX);
        assert_eq!(Interval::new(-5, 5).len(), 11);

        let side = Interval::new(0, 1 << 40);
        let huge = BoxSet::new([side; 4]);
        assert_eq!(huge.card(), u128::MAX);
        let mut set = InstanceSet::empty();
        set.insert(StmtId::new(0), huge.clone());
        set.insert(StmtId::new(1), huge);
        assert_eq!(set.card(), u128::MAX);
    }

    #[test]
    fn subtract_is_exact_and_disjoint() {
        let outer = square(0, 9);
        let hole = square(3, 5);
        let pieces = outer.subtract(&hole);

        let total: u128 = pieces.iter().map(BoxSet::card).sum();
        assert_eq!(total, outer.card() - hole.card());
        for point in outer.points() {
            let hits = pieces.iter().filter(|p| p.contains(&point)).count();
            let expected = usize::from(!hole.contains(&point));
            assert_eq!(hits, expected, "point {point:?}");
        }
    }

    #[test]
    fn subtract_disjoint_keeps_original() {
        let a = square(0, 2);
        assert_eq!(a.subtract(&square(5, 7)), vec![a.clone()]);
        assert!(a.subtract(&square(-1, 3)).is_empty());
    }

    #[test]
    fn instance_set_algebra() {
        let s0 = StmtId::new(0);
        let s1 = StmtId::new(1);
        let mut all = InstanceSet::empty();
        all.insert(s0, square(0, 3));
        all.insert(s1, square(0, 1));

        let mut part = InstanceSet::empty();
        part.insert(s0, square(0, 1));

        let rest = all.subtract(&part);
        assert_eq!(rest.card(), 12 + 4);
        assert!(rest.intersect(&part).is_empty());
        assert_eq!(rest.clone().union(part.clone()).card(), all.card());
        assert_eq!(all.intersect(&part), part);
        assert_eq!(rest.statements().collect::<Vec<_>>(), vec![s0, s1]);
    }
}
