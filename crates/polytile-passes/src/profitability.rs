//! Whole-schedule profitability check.
//!
//! Schedules are compared through a [`LocalityProfile`]: for every statement
//! instance, the accesses its innermost loop walks with a non-unit stride,
//! the accesses whose innermost stride cannot be determined, and the number
//! of coincident loops around it.

use schedule_tree::{BandMember, InstanceSet, Node, Schedule, Stride};

/// Instance-weighted locality and parallelism counts of a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalityProfile {
    /// Accesses walked with a stride other than 0 or 1 by the innermost loop.
    pub strided: u128,
    /// Accesses under an innermost loop not driven by a single iterator.
    pub unknown: u128,
    /// Coincident loops around each instance.
    pub parallel: u128,
    /// Some count did not fit; the other counts are then meaningless.
    pub saturated: bool,
}

impl LocalityProfile {
    pub fn of(schedule: &Schedule) -> Self {
        let mut profile = Self::default();
        let mut members = Vec::new();
        profile.visit(schedule, schedule.root_node(), schedule.domain(), &mut members);
        profile
    }

    fn visit<'a>(
        &mut self,
        schedule: &Schedule,
        node: &'a Node,
        domain: InstanceSet,
        members: &mut Vec<&'a BandMember>,
    ) {
        match node {
            Node::Band { band, child } => {
                let depth = members.len();
                members.extend(band.members.iter());
                self.visit(schedule, child, domain, members);
                members.truncate(depth);
            }
            Node::Filter { filter, child } => {
                self.visit(schedule, child, domain.intersect(filter), members)
            }
            Node::Mark { child, .. } => self.visit(schedule, child, domain, members),
            Node::Sequence(children) | Node::Set(children) => {
                for child in children {
                    self.visit(schedule, child, domain.clone(), members);
                }
            }
            Node::Leaf => self.leaf(schedule, &domain, members),
        }
    }

    fn leaf(&mut self, schedule: &Schedule, domain: &InstanceSet, members: &[&BandMember]) {
        for stmt in domain.statements() {
            let weight = domain
                .pieces(stmt)
                .iter()
                .try_fold(0u128, |weight, piece| weight.checked_add(piece.card()));
            let Some(weight) = weight.filter(|&weight| weight != u128::MAX) else {
                self.saturated = true;
                continue;
            };
            let loops: Vec<_> = members
                .iter()
                .filter(|member| member.expr(stmt).is_some_and(|expr| !expr.is_degenerate()))
                .collect();
            let parallel = loops.iter().filter(|member| member.coincident).count() as u128;
            self.add(Count::Parallel, weight, parallel);

            let Some(innermost) = loops.last().and_then(|member| member.expr(stmt)) else {
                continue;
            };
            let accesses = &schedule.statement(stmt).accesses;
            match innermost.unit_slope_var() {
                Some(var) => {
                    let strided = accesses
                        .iter()
                        .filter(|access| access.stride_along(var) == Stride::Other)
                        .count() as u128;
                    self.add(Count::Strided, weight, strided);
                }
                None => self.add(Count::Unknown, weight, accesses.len() as u128),
            }
        }
    }

    fn add(&mut self, count: Count, weight: u128, per_instance: u128) {
        let slot = match count {
            Count::Strided => &mut self.strided,
            Count::Unknown => &mut self.unknown,
            Count::Parallel => &mut self.parallel,
        };
        match weight
            .checked_mul(per_instance)
            .and_then(|added| slot.checked_add(added))
        {
            Some(total) => *slot = total,
            None => self.saturated = true,
        }
    }
}

#[derive(Clone, Copy)]
enum Count {
    Strided,
    Unknown,
    Parallel,
}

/// Whether `candidate` is expected to run no worse than `original`.
///
/// The candidate must schedule the same statements, walk no more accesses
/// with a bad or unknown stride and keep at least as many coincident loops.
/// Any trade-off between these counts is rejected.
pub fn is_profitable(original: &Schedule, candidate: &Schedule) -> bool {
    if original == candidate {
        return true;
    }
    if original.statements() != candidate.statements() {
        tracing::debug!("candidate schedules different statements");
        return false;
    }
    let before = LocalityProfile::of(original);
    let after = LocalityProfile::of(candidate);
    if before.saturated || after.saturated {
        tracing::debug!("instance counts overflow, keeping the original schedule");
        return false;
    }
    let profitable = after.strided <= before.strided
        && after.unknown <= before.unknown
        && after.parallel >= before.parallel;
    tracing::debug!(?before, ?after, profitable, "profitability check");
    profitable
}
