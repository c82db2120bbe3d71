//! JSON description of a static control part (SCoP).
//!
//! ```json
//! {
//!   "statements": [{
//!     "name": "S",
//!     "iterators": ["i", "j"],
//!     "bounds": [[0, 127], [0, 127]],
//!     "accesses": [
//!       { "kind": "read", "array": "A", "subscripts": [[1, 0, 0], [0, 1, 0]] },
//!       { "kind": "write", "array": "B", "subscripts": [[1, 0, 0], [0, 1, 0]] }
//!     ]
//!   }],
//!   "schedule": {
//!     "band": {
//!       "members": [
//!         { "schedule": { "S": [1, 0, 0] }, "permutable": true, "coincident": true },
//!         { "schedule": { "S": [0, 1, 0] }, "permutable": true, "coincident": true }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Affine expressions are coefficient rows `[c0, ..., cn-1, constant]` over
//! the statement's iterators. Bounds are inclusive.

use std::collections::{BTreeMap, HashMap};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use schedule_tree::{
    AffineExpr, Band, BandMember, BoxSet, InstanceSet, Interval, MemoryAccess, Node, Schedule,
    Statement, StmtId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopDef {
    pub statements: Vec<StatementDef>,
    pub schedule: TreeDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDef {
    pub name: String,
    pub iterators: Vec<String>,
    pub bounds: Vec<[i64; 2]>,
    #[serde(default)]
    pub accesses: Vec<AccessDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKindDef {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDef {
    pub kind: AccessKindDef,
    pub array: String,
    pub subscripts: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDef {
    /// Statement name to coefficient row.
    pub schedule: BTreeMap<String, Vec<i64>>,
    #[serde(default)]
    pub permutable: bool,
    #[serde(default)]
    pub coincident: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    pub statements: Vec<String>,
    #[serde(default)]
    pub child: Option<Box<TreeDef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeDef {
    Band {
        members: Vec<MemberDef>,
        #[serde(default)]
        child: Option<Box<TreeDef>>,
    },
    Mark {
        tag: String,
        #[serde(default)]
        child: Option<Box<TreeDef>>,
    },
    Filter(FilterDef),
    Sequence(Vec<FilterDef>),
    Set(Vec<FilterDef>),
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ScopError {
    #[display("duplicate statement `{_0}`")]
    DuplicateStatement(#[error(not(source))] String),
    #[display("unknown statement `{_0}`")]
    UnknownStatement(#[error(not(source))] String),
    #[display("statement `{name}`: {found} bounds for {expected} iterators")]
    BoundsArity {
        #[error(not(source))]
        name: String,
        expected: usize,
        found: usize,
    },
    #[display("statement `{name}`: affine row of length {found}, expected {expected}")]
    RowArity {
        #[error(not(source))]
        name: String,
        expected: usize,
        found: usize,
    },
}

impl ScopDef {
    pub fn into_schedule(self) -> Result<Schedule, ScopError> {
        let mut ids = HashMap::new();
        let mut statements = Vec::with_capacity(self.statements.len());
        for (index, def) in self.statements.into_iter().enumerate() {
            let id = StmtId::new(index as u32);
            if ids.insert(def.name.clone(), id).is_some() {
                return Err(ScopError::DuplicateStatement(def.name));
            }
            statements.push(def.into_statement(id)?);
        }
        let lowering = Lowering {
            statements: &statements,
            ids: &ids,
        };
        let root = lowering.tree(self.schedule)?;
        Ok(Schedule::new(statements, root))
    }
}

fn affine(name: &str, n_in: usize, row: &[i64]) -> Result<AffineExpr, ScopError> {
    match AffineExpr::from_row(row) {
        Some(expr) if expr.n_in() == n_in => Ok(expr),
        _ => Err(ScopError::RowArity {
            name: name.to_owned(),
            expected: n_in + 1,
            found: row.len(),
        }),
    }
}

impl StatementDef {
    fn into_statement(self, id: StmtId) -> Result<Statement, ScopError> {
        let n_in = self.iterators.len();
        if self.bounds.len() != n_in {
            return Err(ScopError::BoundsArity {
                name: self.name,
                expected: n_in,
                found: self.bounds.len(),
            });
        }
        let accesses = self
            .accesses
            .iter()
            .map(|access| -> Result<MemoryAccess, ScopError> {
                let subscripts = access
                    .subscripts
                    .iter()
                    .map(|row| affine(&self.name, n_in, row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match access.kind {
                    AccessKindDef::Read => MemoryAccess::read(access.array.clone(), subscripts),
                    AccessKindDef::Write => MemoryAccess::write(access.array.clone(), subscripts),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Statement {
            id,
            domain: BoxSet::new(self.bounds.iter().map(|&[lo, hi]| Interval::new(lo, hi))),
            name: self.name,
            iterators: self.iterators,
            accesses,
        })
    }
}

struct Lowering<'a> {
    statements: &'a [Statement],
    ids: &'a HashMap<String, StmtId>,
}

impl Lowering<'_> {
    fn lookup(&self, name: &str) -> Result<&Statement, ScopError> {
        self.ids
            .get(name)
            .map(|id| &self.statements[id.index()])
            .ok_or_else(|| ScopError::UnknownStatement(name.to_owned()))
    }

    fn child(&self, child: Option<Box<TreeDef>>) -> Result<Node, ScopError> {
        match child {
            Some(child) => self.tree(*child),
            None => Ok(Node::Leaf),
        }
    }

    fn tree(&self, def: TreeDef) -> Result<Node, ScopError> {
        Ok(match def {
            TreeDef::Band { members, child } => {
                let members = members
                    .into_iter()
                    .map(|member| self.member(member))
                    .collect::<Result<Vec<_>, _>>()?;
                Node::band(Band::new(members), self.child(child)?)
            }
            TreeDef::Mark { tag, child } => Node::mark(tag, self.child(child)?),
            TreeDef::Filter(filter) => self.filter(filter)?,
            TreeDef::Sequence(filters) => Node::Sequence(self.filters(filters)?),
            TreeDef::Set(filters) => Node::Set(self.filters(filters)?),
            TreeDef::Leaf => Node::Leaf,
        })
    }

    fn member(&self, def: MemberDef) -> Result<BandMember, ScopError> {
        let mut member = BandMember::new(def.permutable, def.coincident);
        for (name, row) in &def.schedule {
            let stmt = self.lookup(name)?;
            member = member.with(stmt.id, affine(name, stmt.n_iterators(), row)?);
        }
        Ok(member)
    }

    fn filter(&self, def: FilterDef) -> Result<Node, ScopError> {
        let ids = def
            .statements
            .iter()
            .map(|name| self.lookup(name).map(|stmt| stmt.id))
            .collect::<Result<Vec<_>, _>>()?;
        let filter = InstanceSet::of_statements(self.statements, ids);
        Ok(Node::filter(filter, self.child(def.child)?))
    }

    fn filters(&self, defs: Vec<FilterDef>) -> Result<Vec<Node>, ScopError> {
        defs.into_iter().map(|def| self.filter(def)).collect()
    }
}
