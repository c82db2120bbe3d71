//! Prevectorization: strip-mine one dimension at the vector width, separate
//! full vector tiles from the remainder and sink the vector loop innermost.

use std::collections::{BTreeMap, BTreeSet};

use schedule_tree::{
    AstOption, BandMember, BoxSet, InstanceSet, Interval, Node, NodeKind, QuasiAffine,
    ScheduleNode,
};

use crate::ascend_to;

/// Mark placed above every sunk vector loop.
pub const SIMD_MARK: &str = "SIMD";

/// Longest iterator range enumerated when looking for full tiles. Longer
/// ranges are treated as partial.
const MAX_ENUMERATED_EXTENT: u64 = 1 << 20;

/// Strip-mine member `dim` of a band by `width` and sink the point loop to
/// the innermost position under a [`SIMD_MARK`] mark.
///
/// Full tiles are isolated from partial ones first (see
/// [`isolate_full_partial_tiles`]). The returned cursor is at the band's
/// original position.
pub fn prevectorize(node: ScheduleNode, dim: usize, width: i64) -> ScheduleNode {
    let Some(band) = node.band() else {
        panic!("prevectorize applied to a {} node", node.kind())
    };
    let n = band.n_member();
    assert!(dim < n, "member {dim} out of range for a band of {n}");
    assert!(width > 0, "vector width must be positive, got {width}");
    tracing::debug!(dim, width, path = ?node.path(), "prevectorizing band");

    let depth = node.path().len();
    let mut node = node;
    if dim > 0 {
        node = node.band_split(dim).child(0);
    }
    if dim + 1 < n {
        node = node.band_split(1);
    }
    let node = node.band_tile(&[width]);
    let tiled_at = node.path().len();

    let mut node = isolate_full_partial_tiles(node, width);
    if node.is_isolation_split() {
        for branch in 0..2 {
            let point = node.child(branch).child(0).child(0);
            node = ascend_to(sink_vector_loop(point), tiled_at);
        }
    } else {
        node = ascend_to(sink_vector_loop(node.child(0)), tiled_at);
    }
    ascend_to(node, depth)
}

fn sink_vector_loop(point: ScheduleNode) -> ScheduleNode {
    // The vector loop must survive as a loop to be matched as one later.
    point
        .band_set_ast_option(AstOption::NoUnroll)
        .band_sink_marked(SIMD_MARK)
}

/// Separate tiles with exactly `width` point iterations from the rest.
///
/// `node` is a one-member tile band directly above its point band. The
/// instances of full tiles end up in an `Isolated` copy of the subtree, the
/// others in an `Atomic` copy, in that order. When every tile is full (or
/// none is) the tree keeps its shape and only the option is set. The cursor
/// stays at the same position.
///
/// Running full tiles first reorders tiles, which is only legal when the
/// tile member carries no dependence. A non-coincident tile band is never
/// split; it is marked `Atomic` when any of its tiles is partial.
pub fn isolate_full_partial_tiles(node: ScheduleNode, width: i64) -> ScheduleNode {
    assert!(
        node.kind() == NodeKind::Band
            && node
                .node()
                .children()
                .first()
                .is_some_and(|child| child.kind() == NodeKind::Band),
        "isolate_full_partial_tiles expects a tile band above its point band"
    );
    let domain = node.domain();
    let full = domain.intersect(&full_tile_instances(&node, width));
    let partial = domain.subtract(&full);
    tracing::debug!(
        full = %full.card(),
        partial = %partial.card(),
        width,
        "isolating full vector tiles"
    );

    if full.is_empty() {
        return node.band_set_ast_option(AstOption::Atomic);
    }
    if partial.is_empty() {
        return node.band_set_ast_option(AstOption::Isolated);
    }
    if !node.band().is_some_and(|tile| tile.member(0).coincident) {
        tracing::debug!("tile member carries a dependence, keeping tile order");
        return node.band_set_ast_option(AstOption::Atomic);
    }
    node.isolate(&full)
        .child(0)
        .child(0)
        .band_set_ast_option(AstOption::Isolated)
        .parent()
        .parent()
        .child(1)
        .child(0)
        .band_set_ast_option(AstOption::Atomic)
        .parent()
        .parent()
}

/// Instances under a tile band whose tile holds exactly `width` distinct
/// point values.
///
/// A tile is identified by the coordinates of every enclosing band member and
/// of the tile band. The analysis applies to statements whose point
/// coordinate and every tile coordinate moving with it depend on a single
/// iterator; instances of other statements are never reported full.
pub fn full_tile_instances(node: &ScheduleNode, width: i64) -> InstanceSet {
    let mut full = InstanceSet::empty();
    let tile = node.band();
    let point = node.node().children().first().and_then(Node::as_band);
    let (Some(tile), Some(point)) = (tile, point) else {
        return full;
    };
    if tile.n_member() != 1 || point.n_member() != 1 {
        return full;
    }

    let mut key_members: Vec<&BandMember> = node.prefix_members();
    key_members.push(tile.member(0));
    let domain = node.domain();
    for stmt in domain.statements() {
        let Some(point_expr) = point.member(0).expr(stmt) else {
            continue;
        };
        let Some(var) = point_expr.univariate() else {
            continue;
        };
        let key_exprs: Vec<&QuasiAffine> = key_members
            .iter()
            .filter_map(|member| member.expr(stmt))
            .filter(|expr| expr.uses(var))
            .collect();
        if key_exprs.iter().any(|expr| expr.univariate() != Some(var)) {
            continue;
        }
        for piece in domain.pieces(stmt) {
            for run in full_runs(piece, var, &key_exprs, point_expr, width) {
                full.insert(stmt, piece.clone().with_bound(var, run));
            }
        }
    }
    full
}

/// Maximal ranges of `var` within `piece` whose tiles are full.
///
/// Every expression depends on `var` alone, so fullness is decided on one
/// line through the box and holds for the whole slab.
fn full_runs(
    piece: &BoxSet,
    var: usize,
    key_exprs: &[&QuasiAffine],
    point_expr: &QuasiAffine,
    width: i64,
) -> Vec<Interval> {
    let span = piece.bound(var);
    if span.len() > MAX_ENUMERATED_EXTENT {
        tracing::trace!(extent = span.len(), "range too long, treating tiles as partial");
        return Vec::new();
    }

    let mut sample: Vec<i64> = piece.bounds().iter().map(|b| b.lo).collect();
    let mut evaluated = Vec::with_capacity(span.len() as usize);
    for x in span.lo..=span.hi {
        sample[var] = x;
        let key: Vec<i64> = key_exprs.iter().map(|expr| expr.eval(&sample)).collect();
        evaluated.push((key, point_expr.eval(&sample)));
    }

    let mut groups: BTreeMap<&[i64], BTreeSet<i64>> = BTreeMap::new();
    for (key, value) in &evaluated {
        groups.entry(key.as_slice()).or_default().insert(*value);
    }

    let mut runs = Vec::new();
    let mut start = None;
    for (x, (key, _)) in (span.lo..=span.hi).zip(&evaluated) {
        let is_full = groups[key.as_slice()].len() as i64 == width;
        match (is_full, start) {
            (true, None) => start = Some(x),
            (false, Some(lo)) => {
                runs.push(Interval::new(lo, x - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(lo) = start {
        runs.push(Interval::new(lo, span.hi));
    }
    runs
}
