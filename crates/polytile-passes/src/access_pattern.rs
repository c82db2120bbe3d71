//! Recognition of matrix-multiply shaped bands.
//!
//! A band matches when it is an innermost band of exactly three members
//! scheduling a single statement, each member a distinct iterator, and the
//! statement looks like `C[i][j] += A[i][k] * B[k][j]`:
//!
//! - every access but the last is a read, with stride 0 or 1 along the
//!   middle member `j` (the innermost one once the band is rotated to
//!   `(k, i, j)`);
//! - the last access is a write with stride 1 along `j` that does not use
//!   the reduction member `k`.
//!
//! The filter is conservative. Near misses such as extra invariant reads are
//! accepted only if they satisfy the same conditions.

use schedule_tree::{ScheduleNode, StmtId, Stride};

/// A confirmed matrix-multiply band. Only [`match_matmul`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatMulCandidate {
    stmt: StmtId,
    reads: Vec<usize>,
    write: usize,
    roles: [usize; 3],
}

impl MatMulCandidate {
    pub fn stmt(&self) -> StmtId {
        self.stmt
    }

    /// Indices of the read accesses, in program order.
    pub fn reads(&self) -> &[usize] {
        &self.reads
    }

    /// Index of the write access.
    pub fn write(&self) -> usize {
        self.write
    }

    /// Iterator driving the outer member.
    pub fn i(&self) -> usize {
        self.roles[0]
    }

    /// Iterator driving the middle member.
    pub fn j(&self) -> usize {
        self.roles[1]
    }

    /// Iterator of the reduction member.
    pub fn k(&self) -> usize {
        self.roles[2]
    }
}

pub fn match_matmul(node: &ScheduleNode) -> Option<MatMulCandidate> {
    let band = node.band()?;
    if band.n_member() != 3 || !node.has_leaf_child() {
        return None;
    }
    let mut stmts = node.domain().statements().collect::<Vec<_>>().into_iter();
    let (Some(stmt), None) = (stmts.next(), stmts.next()) else {
        return None;
    };
    let statement = node.schedule().statement(stmt);

    let mut roles = [0; 3];
    for (role, member) in roles.iter_mut().zip(&band.members) {
        match member.expr(stmt)?.as_affine()?.single_var() {
            Some((var, 1)) => *role = var,
            _ => return None,
        }
    }
    let [i, j, k] = roles;
    if i == j || j == k || i == k {
        return None;
    }

    let (write, reads) = statement.accesses.split_last()?;
    if reads.is_empty()
        || !write.is_write()
        || write.uses(k)
        || write.stride_along(j) != Stride::One
    {
        return None;
    }
    let stride_compatible = reads
        .iter()
        .all(|read| read.is_read() && matches!(read.stride_along(j), Stride::Zero | Stride::One));
    if !stride_compatible {
        return None;
    }

    tracing::debug!(stmt = %statement.name, i, j, k, "matched matrix multiplication");
    Some(MatMulCandidate {
        stmt,
        reads: (0..reads.len()).collect(),
        write: reads.len(),
        roles,
    })
}
