//! Affine and quasi-affine expressions over statement iterators.
//!
//! A schedule dimension maps a statement instance (its iterator values) to an
//! integer coordinate. Untransformed schedules use plain affine expressions;
//! tiling introduces `floor(e/s)` tile coordinates and `e mod s` point
//! coordinates, so band members carry [`QuasiAffine`] expressions.

use std::fmt;

use smallvec::SmallVec;

/// Coefficient storage; loop nests rarely exceed four iterators.
pub type Coeffs = SmallVec<[i64; 4]>;

/// `c0*x0 + c1*x1 + ... + constant` over a statement's iterators.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AffineExpr {
    coeffs: Coeffs,
    constant: i64,
}

impl AffineExpr {
    pub fn new(coeffs: impl IntoIterator<Item = i64>, constant: i64) -> Self {
        Self {
            coeffs: coeffs.into_iter().collect(),
            constant,
        }
    }

    /// The expression `x_var` over `n_in` iterators.
    pub fn var(n_in: usize, var: usize) -> Self {
        assert!(var < n_in, "iterator {var} out of range for {n_in} iterators");
        let mut coeffs: Coeffs = smallvec::smallvec![0; n_in];
        coeffs[var] = 1;
        Self { coeffs, constant: 0 }
    }

    pub fn constant(n_in: usize, value: i64) -> Self {
        Self {
            coeffs: smallvec::smallvec![0; n_in],
            constant: value,
        }
    }

    /// Build from a row `[c0, ..., c(n-1), constant]`.
    pub fn from_row(row: &[i64]) -> Option<Self> {
        let (constant, coeffs) = row.split_last()?;
        Some(Self::new(coeffs.iter().copied(), *constant))
    }

    pub fn n_in(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    pub fn coeff(&self, var: usize) -> i64 {
        self.coeffs.get(var).copied().unwrap_or(0)
    }

    pub fn constant_term(&self) -> i64 {
        self.constant
    }

    pub fn uses(&self, var: usize) -> bool {
        self.coeff(var) != 0
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// The single iterator this expression depends on, with its coefficient.
    pub fn single_var(&self) -> Option<(usize, i64)> {
        let mut used = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0)
            .map(|(var, c)| (var, *c));
        let first = used.next()?;
        used.next().is_none().then_some(first)
    }

    pub fn eval(&self, point: &[i64]) -> i64 {
        debug_assert_eq!(point.len(), self.coeffs.len());
        self.coeffs
            .iter()
            .zip(point)
            .fold(self.constant, |acc, (c, x)| acc + c * x)
    }

    pub fn display<'a>(&'a self, names: &'a [String]) -> impl fmt::Display + 'a {
        DisplayAffine { expr: self, names }
    }
}

struct DisplayAffine<'a> {
    expr: &'a AffineExpr,
    names: &'a [String],
}

impl fmt::Display for DisplayAffine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, &c) in self.expr.coeffs.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let name = iterator_name(self.names, var);
            let magnitude = c.unsigned_abs();
            match (first, c < 0) {
                (true, false) => {}
                (true, true) => write!(f, "-")?,
                (false, false) => write!(f, " + ")?,
                (false, true) => write!(f, " - ")?,
            }
            if magnitude == 1 {
                write!(f, "{name}")?;
            } else {
                write!(f, "{magnitude}{name}")?;
            }
            first = false;
        }
        let constant = self.expr.constant;
        if first {
            write!(f, "{constant}")
        } else if constant > 0 {
            write!(f, " + {constant}")
        } else if constant < 0 {
            write!(f, " - {}", constant.unsigned_abs())
        } else {
            Ok(())
        }
    }
}

pub(crate) fn iterator_name(names: &[String], var: usize) -> String {
    names
        .get(var)
        .cloned()
        .unwrap_or_else(|| format!("i{var}"))
}

/// Quasi-affine schedule expression: affine, floor division or modulo by a
/// positive constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QuasiAffine {
    Affine(AffineExpr),
    FloorDiv(Box<QuasiAffine>, i64),
    Mod(Box<QuasiAffine>, i64),
}

impl From<AffineExpr> for QuasiAffine {
    fn from(expr: AffineExpr) -> Self {
        QuasiAffine::Affine(expr)
    }
}

impl QuasiAffine {
    pub fn var(n_in: usize, var: usize) -> Self {
        QuasiAffine::Affine(AffineExpr::var(n_in, var))
    }

    pub fn floor_div(self, divisor: i64) -> Self {
        assert!(divisor > 0, "floor division by non-positive {divisor}");
        QuasiAffine::FloorDiv(Box::new(self), divisor)
    }

    pub fn modulo(self, modulus: i64) -> Self {
        assert!(modulus > 0, "modulo by non-positive {modulus}");
        QuasiAffine::Mod(Box::new(self), modulus)
    }

    pub fn eval(&self, point: &[i64]) -> i64 {
        match self {
            QuasiAffine::Affine(expr) => expr.eval(point),
            QuasiAffine::FloorDiv(inner, d) => inner.eval(point).div_euclid(*d),
            QuasiAffine::Mod(inner, m) => inner.eval(point).rem_euclid(*m),
        }
    }

    /// The innermost affine expression.
    pub fn base(&self) -> &AffineExpr {
        match self {
            QuasiAffine::Affine(expr) => expr,
            QuasiAffine::FloorDiv(inner, _) | QuasiAffine::Mod(inner, _) => inner.base(),
        }
    }

    pub fn as_affine(&self) -> Option<&AffineExpr> {
        match self {
            QuasiAffine::Affine(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn uses(&self, var: usize) -> bool {
        !self.is_degenerate() && self.base().uses(var)
    }

    /// The single iterator the expression depends on, if any.
    pub fn univariate(&self) -> Option<usize> {
        if self.is_degenerate() {
            return None;
        }
        self.base().single_var().map(|(var, _)| var)
    }

    /// Whether the expression is constant over every instance.
    pub fn is_degenerate(&self) -> bool {
        match self {
            QuasiAffine::Affine(expr) => expr.is_constant(),
            QuasiAffine::Mod(_, 1) => true,
            QuasiAffine::FloorDiv(inner, _) | QuasiAffine::Mod(inner, _) => inner.is_degenerate(),
        }
    }

    /// The iterator `x` such that stepping this coordinate by one steps `x`
    /// by one, within a tile.
    ///
    /// Modulo keeps the local slope of its argument; floor division by more
    /// than one does not.
    pub fn unit_slope_var(&self) -> Option<usize> {
        match self {
            QuasiAffine::Affine(expr) => match expr.single_var() {
                Some((var, 1)) => Some(var),
                _ => None,
            },
            QuasiAffine::Mod(_, 1) => None,
            QuasiAffine::Mod(inner, _) => inner.unit_slope_var(),
            QuasiAffine::FloorDiv(inner, 1) => inner.unit_slope_var(),
            QuasiAffine::FloorDiv(..) => None,
        }
    }

    pub fn display<'a>(&'a self, names: &'a [String]) -> impl fmt::Display + 'a {
        DisplayQuasi { expr: self, names }
    }
}

struct DisplayQuasi<'a> {
    expr: &'a QuasiAffine,
    names: &'a [String],
}

impl fmt::Display for DisplayQuasi<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr {
            QuasiAffine::Affine(expr) => write!(f, "{}", expr.display(self.names)),
            QuasiAffine::FloorDiv(inner, d) => {
                write!(f, "floor(({})/{d})", inner.display(self.names))
            }
            QuasiAffine::Mod(inner, m) => write!(f, "({}) mod {m}", inner.display(self.names)),
        }
    }
}
