//! Statements, their iteration domains and memory accesses.

use std::fmt;

use crate::affine::AffineExpr;
use crate::domain::BoxSet;

/// Dense statement index into [`crate::Schedule::statements`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(u32);

impl StmtId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// Stride of an access along one iterator, measured in the last array
/// dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stride {
    /// The access does not move.
    Zero,
    /// Consecutive iterations touch consecutive elements.
    One,
    Other,
}

/// One array access of a statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    pub kind: AccessKind,
    pub array: String,
    pub subscripts: Vec<AffineExpr>,
}

impl MemoryAccess {
    pub fn read(array: impl Into<String>, subscripts: Vec<AffineExpr>) -> Self {
        Self {
            kind: AccessKind::Read,
            array: array.into(),
            subscripts,
        }
    }

    pub fn write(array: impl Into<String>, subscripts: Vec<AffineExpr>) -> Self {
        Self {
            kind: AccessKind::Write,
            array: array.into(),
            subscripts,
        }
    }

    pub fn is_read(&self) -> bool {
        self.kind == AccessKind::Read
    }

    pub fn is_write(&self) -> bool {
        self.kind == AccessKind::Write
    }

    pub fn uses(&self, var: usize) -> bool {
        self.subscripts.iter().any(|s| s.uses(var))
    }

    /// Classify the stride of this access when only `var` advances by one.
    pub fn stride_along(&self, var: usize) -> Stride {
        let Some((last, leading)) = self.subscripts.split_last() else {
            return Stride::Zero;
        };
        if leading.iter().any(|s| s.uses(var)) {
            return Stride::Other;
        }
        match last.coeff(var) {
            0 => Stride::Zero,
            1 => Stride::One,
            _ => Stride::Other,
        }
    }
}

/// A statement of the optimized region.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub id: StmtId,
    pub name: String,
    pub iterators: Vec<String>,
    pub domain: BoxSet,
    /// Accesses in program order; for an update the write comes last.
    pub accesses: Vec<MemoryAccess>,
}

impl Statement {
    pub fn n_iterators(&self) -> usize {
        self.iterators.len()
    }
}
