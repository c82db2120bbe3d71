//! Band classification.

use schedule_tree::{Band, ScheduleNode};

/// Whether `node` is an innermost band with at least one permutable member.
///
/// Only bands directly above a leaf qualify, so tiling proceeds from the
/// innermost loops outwards.
pub fn is_tileable(node: &ScheduleNode) -> bool {
    match node.band() {
        Some(band) => node.has_leaf_child() && band.permutable_suffix() > 0,
        None => false,
    }
}

/// Number of trailing members that may be tiled together.
pub fn tileable_dims(node: &ScheduleNode) -> usize {
    node.band().map_or(0, Band::permutable_suffix)
}

/// The member to prevectorize: the innermost coincident member that, together
/// with every member after it, is permutable.
pub fn vector_dimension(band: &Band) -> Option<usize> {
    let n = band.n_member();
    (n - band.permutable_suffix()..n)
        .rev()
        .find(|&pos| band.member(pos).coincident)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{copy_2d, gemm, identity_band, statement};
    use schedule_tree::{Node, Schedule, StmtId};

    #[test]
    fn innermost_band_is_tileable() {
        let node = copy_2d(8, 8).into_root();
        assert!(is_tileable(&node));
        assert_eq!(tileable_dims(&node), 2);
    }

    #[test]
    fn outer_band_is_not_tileable() {
        let node = copy_2d(8, 8).into_root().band_split(1);
        assert!(!is_tileable(&node));
        assert!(is_tileable(&node.child(0)));
    }

    #[test]
    fn non_permutable_band_is_not_tileable() {
        let s = statement(0, &["i"], &[8], Vec::new());
        let mut band = identity_band(s.id, &[true]);
        band.members[0].permutable = false;
        let node = Schedule::new(vec![s], Node::band(band, Node::Leaf)).into_root();
        assert!(!is_tileable(&node));
        assert_eq!(tileable_dims(&node), 0);
        assert!(!is_tileable(&node.child(0)));
    }

    #[test]
    fn vector_dimension_is_innermost_coincident() {
        let node = gemm(8).into_root();
        // k carries the reduction, so j is vectorized
        assert_eq!(vector_dimension(node.band().unwrap()), Some(1));

        let mut band = identity_band(StmtId::new(0), &[true, true]);
        band.members[0].permutable = false;
        assert_eq!(vector_dimension(&band), Some(1));
        band.members[1].coincident = false;
        assert_eq!(vector_dimension(&band), None);

        let mut band = identity_band(StmtId::new(0), &[true, true]);
        band.members[1].permutable = false;
        assert_eq!(vector_dimension(&band), None);
    }
}
