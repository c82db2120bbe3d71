//! Small schedules shared by the unit tests.

use schedule_tree::{
    AffineExpr, Band, BandMember, BoxSet, Interval, MemoryAccess, Node, QuasiAffine, Schedule,
    Statement, StmtId,
};

pub(crate) fn sub(row: &[i64]) -> AffineExpr {
    AffineExpr::from_row(row).unwrap()
}

pub(crate) fn statement(
    id: u32,
    iterators: &[&str],
    extents: &[i64],
    accesses: Vec<MemoryAccess>,
) -> Statement {
    Statement {
        id: StmtId::new(id),
        name: format!("S{id}"),
        iterators: iterators.iter().map(|&it| it.to_owned()).collect(),
        domain: BoxSet::new(extents.iter().map(|&e| Interval::extent(e))),
        accesses,
    }
}

/// One member per iterator, in iterator order, all permutable.
pub(crate) fn identity_band(stmt: StmtId, coincident: &[bool]) -> Band {
    let n = coincident.len();
    Band::new(
        coincident
            .iter()
            .enumerate()
            .map(|(d, &c)| BandMember::new(true, c).with(stmt, QuasiAffine::var(n, d)))
            .collect(),
    )
}

/// `B[i][j] = A[i][j]` over `ni x nj`.
pub(crate) fn copy_2d(ni: i64, nj: i64) -> Schedule {
    let accesses = vec![
        MemoryAccess::read("A", vec![sub(&[1, 0, 0]), sub(&[0, 1, 0])]),
        MemoryAccess::write("B", vec![sub(&[1, 0, 0]), sub(&[0, 1, 0])]),
    ];
    let s = statement(0, &["i", "j"], &[ni, nj], accesses);
    let band = identity_band(s.id, &[true, true]);
    Schedule::new(vec![s], Node::band(band, Node::Leaf))
}

/// Accesses of `C[i][j] += A[i][k] * B[k][j]` over `(i, j, k)`.
pub(crate) fn gemm_accesses() -> Vec<MemoryAccess> {
    vec![
        MemoryAccess::read("C", vec![sub(&[1, 0, 0, 0]), sub(&[0, 1, 0, 0])]),
        MemoryAccess::read("A", vec![sub(&[1, 0, 0, 0]), sub(&[0, 0, 1, 0])]),
        MemoryAccess::read("B", vec![sub(&[0, 0, 1, 0]), sub(&[0, 1, 0, 0])]),
        MemoryAccess::write("C", vec![sub(&[1, 0, 0, 0]), sub(&[0, 1, 0, 0])]),
    ]
}

pub(crate) fn gemm(n: i64) -> Schedule {
    let s = statement(0, &["i", "j", "k"], &[n, n, n], gemm_accesses());
    let band = identity_band(s.id, &[true, true, false]);
    Schedule::new(vec![s], Node::band(band, Node::Leaf))
}
