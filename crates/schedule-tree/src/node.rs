//! Schedule tree nodes and whole schedules.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use derive_more::{Display, Error};

use crate::affine::QuasiAffine;
use crate::domain::InstanceSet;
use crate::statement::{Statement, StmtId};
use crate::walk::WalkAction;

/// One dimension of a band's partial schedule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BandMember {
    /// Coordinate of each statement instance in this dimension.
    pub schedule: BTreeMap<StmtId, QuasiAffine>,
    /// May be reordered or tiled with the other permutable members.
    pub permutable: bool,
    /// Carries no dependence.
    pub coincident: bool,
}

impl BandMember {
    pub fn new(permutable: bool, coincident: bool) -> Self {
        Self {
            schedule: BTreeMap::new(),
            permutable,
            coincident,
        }
    }

    pub fn with(mut self, stmt: StmtId, expr: impl Into<QuasiAffine>) -> Self {
        self.schedule.insert(stmt, expr.into());
        self
    }

    pub fn expr(&self, stmt: StmtId) -> Option<&QuasiAffine> {
        self.schedule.get(&stmt)
    }

    /// Apply `f` to every statement's expression, keeping the flags.
    pub fn map_exprs(&self, mut f: impl FnMut(&QuasiAffine) -> QuasiAffine) -> BandMember {
        BandMember {
            schedule: self
                .schedule
                .iter()
                .map(|(stmt, expr)| (*stmt, f(expr)))
                .collect(),
            permutable: self.permutable,
            coincident: self.coincident,
        }
    }

    /// Evaluate for one instance; statements without an expression sit at 0.
    pub fn eval(&self, stmt: StmtId, point: &[i64]) -> i64 {
        self.expr(stmt).map_or(0, |expr| expr.eval(point))
    }
}

/// Code generation hint attached to a band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum AstOption {
    #[default]
    #[display("default")]
    Default,
    /// Fully unroll the band's loops.
    #[display("unroll")]
    Unroll,
    /// Keep the loop; it is matched as a vector loop later.
    #[display("no-unroll")]
    NoUnroll,
    /// Every tile below has its full, fixed trip count.
    #[display("isolated")]
    Isolated,
    /// Remainder of an isolation; generate a single generic loop.
    #[display("atomic")]
    Atomic,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Band {
    pub members: Vec<BandMember>,
    pub ast_option: AstOption,
}

impl Band {
    pub fn new(members: Vec<BandMember>) -> Self {
        Self {
            members,
            ast_option: AstOption::Default,
        }
    }

    pub fn n_member(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, pos: usize) -> &BandMember {
        &self.members[pos]
    }

    /// Whether every member is permutable.
    pub fn is_permutable(&self) -> bool {
        self.members.iter().all(|m| m.permutable)
    }

    /// Number of trailing members that are all permutable.
    pub fn permutable_suffix(&self) -> usize {
        self.members
            .iter()
            .rev()
            .take_while(|m| m.permutable)
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    #[display("band")]
    Band,
    #[display("mark")]
    Mark,
    #[display("filter")]
    Filter,
    #[display("sequence")]
    Sequence,
    #[display("set")]
    Set,
    #[display("leaf")]
    Leaf,
}

/// A schedule tree node. Children are owned; the tree is a plain value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Band { band: Band, child: Box<Node> },
    Mark { tag: String, child: Box<Node> },
    Filter { filter: InstanceSet, child: Box<Node> },
    /// Children execute one after another; every child is a filter.
    Sequence(Vec<Node>),
    /// Children may execute in any order; every child is a filter.
    Set(Vec<Node>),
    Leaf,
}

impl Node {
    pub fn band(band: Band, child: Node) -> Self {
        Node::Band {
            band,
            child: Box::new(child),
        }
    }

    pub fn mark(tag: impl Into<String>, child: Node) -> Self {
        Node::Mark {
            tag: tag.into(),
            child: Box::new(child),
        }
    }

    pub fn filter(filter: InstanceSet, child: Node) -> Self {
        Node::Filter {
            filter,
            child: Box::new(child),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Band { .. } => NodeKind::Band,
            Node::Mark { .. } => NodeKind::Mark,
            Node::Filter { .. } => NodeKind::Filter,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Set(_) => NodeKind::Set,
            Node::Leaf => NodeKind::Leaf,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Band { child, .. } | Node::Mark { child, .. } | Node::Filter { child, .. } => {
                std::slice::from_ref(child.as_ref())
            }
            Node::Sequence(children) | Node::Set(children) => children,
            Node::Leaf => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        match self {
            Node::Band { child, .. } | Node::Mark { child, .. } | Node::Filter { child, .. } => {
                std::slice::from_mut(child.as_mut())
            }
            Node::Sequence(children) | Node::Set(children) => children,
            Node::Leaf => &mut [],
        }
    }

    pub fn as_band(&self) -> Option<&Band> {
        match self {
            Node::Band { band, .. } => Some(band),
            _ => None,
        }
    }

    pub fn as_mark(&self) -> Option<&str> {
        match self {
            Node::Mark { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf)
    }

    /// Walk this node and its descendants in pre-order.
    ///
    /// Returning `Continue(WalkAction::Skip)` skips the node's children.
    pub fn walk_all<B>(
        &self,
        mut f: impl FnMut(&Node) -> ControlFlow<B, WalkAction>,
    ) -> ControlFlow<B, ()> {
        walk_node_internal(self, &mut f)
    }
}

fn walk_node_internal<B>(
    node: &Node,
    f: &mut dyn FnMut(&Node) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(node) {
        ControlFlow::Break(b) => return ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => return ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => {}
    }
    for child in node.children() {
        walk_node_internal(child, f)?;
    }
    ControlFlow::Continue(())
}

/// A whole schedule: the statements of a region and the tree ordering them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Schedule {
    statements: Vec<Statement>,
    pub(crate) root: Node,
}

impl Schedule {
    pub fn new(statements: Vec<Statement>, root: Node) -> Self {
        Self { statements, root }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, id: StmtId) -> &Statement {
        &self.statements[id.index()]
    }

    pub fn root_node(&self) -> &Node {
        &self.root
    }

    /// Every statement instance of the region.
    pub fn domain(&self) -> InstanceSet {
        InstanceSet::universe(&self.statements)
    }

    /// Check structural well-formedness.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, stmt) in self.statements.iter().enumerate() {
            if stmt.id.index() != index {
                return Err(ValidationError::StatementOrder {
                    index,
                    id: stmt.id,
                });
            }
            if stmt.domain.dims() != stmt.n_iterators() {
                return Err(ValidationError::DomainArity {
                    stmt: stmt.id,
                    expected: stmt.n_iterators(),
                    found: stmt.domain.dims(),
                });
            }
            for access in &stmt.accesses {
                if let Some(sub) = access
                    .subscripts
                    .iter()
                    .find(|s| s.n_in() != stmt.n_iterators())
                {
                    return Err(ValidationError::ExprArity {
                        stmt: stmt.id,
                        expected: stmt.n_iterators(),
                        found: sub.n_in(),
                    });
                }
            }
        }
        let mut result = Ok(());
        let _ = self.root.walk_all(|node| {
            if let Err(err) = self.validate_node(node) {
                result = Err(err);
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(WalkAction::Advance)
        });
        result
    }

    fn validate_node(&self, node: &Node) -> Result<(), ValidationError> {
        match node {
            Node::Band { band, .. } => {
                for member in &band.members {
                    for (stmt, expr) in &member.schedule {
                        let Some(statement) = self.statements.get(stmt.index()) else {
                            return Err(ValidationError::UnknownStatement { stmt: *stmt });
                        };
                        if expr.base().n_in() != statement.n_iterators() {
                            return Err(ValidationError::ExprArity {
                                stmt: *stmt,
                                expected: statement.n_iterators(),
                                found: expr.base().n_in(),
                            });
                        }
                    }
                }
                Ok(())
            }
            Node::Filter { filter, .. } => {
                match filter
                    .statements()
                    .find(|s| s.index() >= self.statements.len())
                {
                    Some(stmt) => Err(ValidationError::UnknownStatement { stmt }),
                    None => Ok(()),
                }
            }
            Node::Sequence(children) | Node::Set(children) => {
                match children.iter().find(|c| c.kind() != NodeKind::Filter) {
                    Some(child) => Err(ValidationError::NonFilterChild { kind: child.kind() }),
                    None => Ok(()),
                }
            }
            Node::Mark { .. } | Node::Leaf => Ok(()),
        }
    }
}

/// Structural problems detected by [`Schedule::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ValidationError {
    #[display("statement at index {index} has id {id}")]
    StatementOrder {
        index: usize,
        #[error(not(source))]
        id: StmtId,
    },
    #[display("{stmt}: domain has {found} dimensions, expected {expected}")]
    DomainArity {
        #[error(not(source))]
        stmt: StmtId,
        expected: usize,
        found: usize,
    },
    #[display("{stmt}: expression over {found} iterators, expected {expected}")]
    ExprArity {
        #[error(not(source))]
        stmt: StmtId,
        expected: usize,
        found: usize,
    },
    #[display("unknown statement {stmt}")]
    UnknownStatement {
        #[error(not(source))]
        stmt: StmtId,
    },
    #[display("sequence/set child is a {kind}, expected a filter")]
    NonFilterChild {
        #[error(not(source))]
        kind: NodeKind,
    },
}
