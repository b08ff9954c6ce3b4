//! Core expression types.
//!
//! An `Expression` is an immutable tagged tree node: a type tag from a closed
//! set, an ordered list of child expressions, and an optional type-specific
//! attribute record shared behind an `Arc`. Cloning an expression is cheap
//! and subtrees may be shared freely.

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;

use super::shape::Shape;

/// Identifier for free variables.
///
/// Live variable ids are positive; [`crate::canon::CONST_COEFFICIENT_ID`]
/// reserves a negative value for the constant column of a coefficient map.
pub type VarId = i64;

/// The closed set of expression type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    // Leaves
    Const,
    Var,

    // Affine atoms
    Add,
    Neg,
    Mul,
    SumEntries,
    Hstack,
    Vstack,
    Reshape,
    Index,
    DiagMat,
    DiagVec,
    Transpose,
    Trace,

    // Non-linear convex atoms
    Abs,
    PNorm,
    QuadOverLin,

    // Constraints
    Leq,
    Soc,
}

impl ExprKind {
    /// Lowercase name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Const => "const",
            ExprKind::Var => "var",
            ExprKind::Add => "add",
            ExprKind::Neg => "neg",
            ExprKind::Mul => "mul",
            ExprKind::SumEntries => "sum_entries",
            ExprKind::Hstack => "hstack",
            ExprKind::Vstack => "vstack",
            ExprKind::Reshape => "reshape",
            ExprKind::Index => "index",
            ExprKind::DiagMat => "diag_mat",
            ExprKind::DiagVec => "diag_vec",
            ExprKind::Transpose => "transpose",
            ExprKind::Trace => "trace",
            ExprKind::Abs => "abs",
            ExprKind::PNorm => "p_norm",
            ExprKind::QuadOverLin => "quad_over_lin",
            ExprKind::Leq => "leq",
            ExprKind::Soc => "soc",
        }
    }
}

/// Attributes of a constant leaf.
#[derive(Debug, Clone)]
pub struct ConstAttributes {
    /// Dense value, column-major.
    pub data: DMatrix<f64>,
}

/// Attributes of a variable leaf.
#[derive(Debug, Clone)]
pub struct VarAttributes {
    /// Stable identifier, unique per free variable.
    pub id: VarId,
    /// Variable shape.
    pub rows: usize,
    pub cols: usize,
    /// Optional name for display and naming stability of auxiliaries.
    pub name: Option<String>,
}

/// One axis of an index operation.
///
/// Negative `start`/`stop` are interpreted relative to the axis length
/// (resolved by adding the length once). `step` is non-zero and may be
/// negative, in which case enumeration runs in decreasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: isize,
    pub stop: isize,
    pub step: isize,
}

impl Slice {
    /// Create a slice. `step` must be non-zero.
    pub fn new(start: isize, stop: isize, step: isize) -> Self {
        assert!(step != 0, "slice step must be non-zero");
        Slice { start, stop, step }
    }

    /// Slice selecting a whole axis of length `len` in order.
    pub fn all(len: usize) -> Self {
        Slice::new(0, len as isize, 1)
    }

    /// Slice selecting a whole axis of length `len` in reverse order.
    pub fn reversed(len: usize) -> Self {
        Slice::new(len as isize - 1, -(len as isize) - 1, -1)
    }

    /// Resolve negative `start`/`stop` against the axis length.
    pub(crate) fn resolve(&self, len: usize) -> (isize, isize) {
        let n = len as isize;
        let start = if self.start < 0 { self.start + n } else { self.start };
        let stop = if self.stop < 0 { self.stop + n } else { self.stop };
        (start, stop)
    }

    /// Number of indices the slice selects from an axis of length `len`.
    ///
    /// Mirrors the enumeration loop of the index coefficient builder: bounds
    /// are checked before selecting, the stop bound after stepping.
    pub fn select_count(&self, len: usize) -> usize {
        let (start, stop) = self.resolve(len);
        let n = len as isize;
        let mut count = 0;
        let mut i = start;
        loop {
            if i < 0 || i >= n {
                break;
            }
            count += 1;
            i += self.step;
            if (self.step > 0 && i >= stop) || (self.step < 0 && i < stop) {
                break;
            }
        }
        count
    }
}

/// Attributes of an index operation: one slice per axis.
#[derive(Debug, Clone)]
pub struct IndexAttributes {
    pub row: Slice,
    pub col: Slice,
}

/// Attributes of a p-norm.
#[derive(Debug, Clone)]
pub struct PNormAttributes {
    pub p: f64,
}

/// Attributes of a reshape: the target shape.
#[derive(Debug, Clone)]
pub struct ReshapeAttributes {
    pub rows: usize,
    pub cols: usize,
}

/// Type-specific attribute record attached to a node.
#[derive(Debug, Clone)]
pub enum Attributes {
    Const(ConstAttributes),
    Var(VarAttributes),
    Index(IndexAttributes),
    PNorm(PNormAttributes),
    Reshape(ReshapeAttributes),
}

#[derive(Debug)]
struct Node {
    kind: ExprKind,
    args: Vec<Expression>,
    attr: Option<Arc<Attributes>>,
    shape: Shape,
}

/// An immutable expression tree node.
#[derive(Debug, Clone)]
pub struct Expression {
    inner: Arc<Node>,
}

impl Expression {
    /// Generic constructor: build a node from a type tag, children, and an
    /// attribute handle. The shape is inferred from the three.
    ///
    /// This is the constructor the cone-transform driver uses to rebuild a
    /// node around transformed children while forwarding the original
    /// attribute record.
    pub fn with_args(kind: ExprKind, args: Vec<Expression>, attr: Option<Arc<Attributes>>) -> Self {
        let shape = infer_shape(kind, &args, attr.as_deref());
        Expression {
            inner: Arc::new(Node {
                kind,
                args,
                attr,
                shape,
            }),
        }
    }

    /// The node's type tag.
    pub fn kind(&self) -> ExprKind {
        self.inner.kind
    }

    /// Ordered child expressions.
    pub fn args(&self) -> &[Expression] {
        &self.inner.args
    }

    /// The `i`-th child.
    pub fn arg(&self, i: usize) -> &Expression {
        &self.inner.args[i]
    }

    /// The node's shape.
    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    /// Flattened size, `rows * cols`.
    pub fn dim(&self) -> usize {
        self.inner.shape.size()
    }

    /// Opaque attribute handle, for forwarding to rebuilt nodes.
    pub fn attr_handle(&self) -> Option<Arc<Attributes>> {
        self.inner.attr.clone()
    }

    /// Constant attributes, if this is a `Const` node.
    pub fn const_attrs(&self) -> Option<&ConstAttributes> {
        match self.inner.attr.as_deref() {
            Some(Attributes::Const(a)) => Some(a),
            _ => None,
        }
    }

    /// Variable attributes, if this is a `Var` node.
    pub fn var_attrs(&self) -> Option<&VarAttributes> {
        match self.inner.attr.as_deref() {
            Some(Attributes::Var(a)) => Some(a),
            _ => None,
        }
    }

    /// Index attributes, if this is an `Index` node.
    pub fn index_attrs(&self) -> Option<&IndexAttributes> {
        match self.inner.attr.as_deref() {
            Some(Attributes::Index(a)) => Some(a),
            _ => None,
        }
    }

    /// p-norm attributes, if this is a `PNorm` node.
    pub fn pnorm_attrs(&self) -> Option<&PNormAttributes> {
        match self.inner.attr.as_deref() {
            Some(Attributes::PNorm(a)) => Some(a),
            _ => None,
        }
    }

    /// The variable id, if this is a `Var` node.
    pub fn variable_id(&self) -> Option<VarId> {
        self.var_attrs().map(|a| a.id)
    }

    /// Check if this is a constant leaf.
    pub fn is_constant(&self) -> bool {
        self.inner.kind == ExprKind::Const
    }

    /// Check if this is a variable leaf.
    pub fn is_variable(&self) -> bool {
        self.inner.kind == ExprKind::Var
    }
}

/// Compute the shape of a node from its tag, children, and attributes.
///
/// Operand shapes are asserted against each atom's shape rule; violations
/// are caller errors, not recoverable conditions.
fn infer_shape(kind: ExprKind, args: &[Expression], attr: Option<&Attributes>) -> Shape {
    match kind {
        ExprKind::Const => match attr {
            Some(Attributes::Const(a)) => Shape::matrix(a.data.nrows(), a.data.ncols()),
            _ => panic!("const node requires ConstAttributes"),
        },
        ExprKind::Var => match attr {
            Some(Attributes::Var(a)) => Shape::matrix(a.rows, a.cols),
            _ => panic!("var node requires VarAttributes"),
        },
        ExprKind::Add | ExprKind::Leq => {
            // Arguments are either the result shape or scalar.
            let shape = args
                .iter()
                .map(|a| a.shape())
                .find(|s| !s.is_scalar())
                .unwrap_or_else(Shape::scalar);
            for arg in args {
                assert!(
                    arg.shape().is_scalar() || arg.shape() == shape,
                    "{} operand shapes {} and {} are incompatible",
                    kind.name(),
                    arg.shape(),
                    shape
                );
            }
            shape
        }
        ExprKind::Neg | ExprKind::Abs => args[0].shape(),
        ExprKind::Mul => {
            assert_eq!(args.len(), 2, "mul takes exactly two operands");
            let (a, b) = (args[0].shape(), args[1].shape());
            if a.is_scalar() {
                b
            } else if b.is_scalar() {
                a
            } else {
                assert_eq!(
                    a.cols(),
                    b.rows(),
                    "mul operand shapes {} and {} are incompatible",
                    a,
                    b
                );
                Shape::matrix(a.rows(), b.cols())
            }
        }
        ExprKind::SumEntries | ExprKind::Trace | ExprKind::PNorm | ExprKind::QuadOverLin | ExprKind::Soc => {
            Shape::scalar()
        }
        ExprKind::Hstack => {
            let rows = args[0].shape().rows();
            let cols = args.iter().map(|a| a.shape().cols()).sum();
            for arg in args {
                assert_eq!(arg.shape().rows(), rows, "hstack operands disagree on rows");
            }
            Shape::matrix(rows, cols)
        }
        ExprKind::Vstack => {
            let cols = args[0].shape().cols();
            let rows = args.iter().map(|a| a.shape().rows()).sum();
            for arg in args {
                assert_eq!(arg.shape().cols(), cols, "vstack operands disagree on cols");
            }
            Shape::matrix(rows, cols)
        }
        ExprKind::Reshape => match attr {
            Some(Attributes::Reshape(a)) => {
                assert_eq!(
                    a.rows * a.cols,
                    args[0].dim(),
                    "reshape must preserve the element count"
                );
                Shape::matrix(a.rows, a.cols)
            }
            _ => panic!("reshape node requires ReshapeAttributes"),
        },
        ExprKind::Index => match attr {
            Some(Attributes::Index(a)) => {
                let child = args[0].shape();
                Shape::matrix(a.row.select_count(child.rows()), a.col.select_count(child.cols()))
            }
            _ => panic!("index node requires IndexAttributes"),
        },
        ExprKind::DiagVec => {
            let child = args[0].shape();
            assert!(child.is_vector(), "diag_vec operand must be a column vector");
            Shape::matrix(child.rows(), child.rows())
        }
        ExprKind::DiagMat => {
            let child = args[0].shape();
            assert!(child.is_square(), "diag_mat operand must be square");
            Shape::vector(child.rows())
        }
        ExprKind::Transpose => args[0].shape().transpose(),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Const => write!(f, "const{}", self.shape()),
            ExprKind::Var => {
                let attrs = self.var_attrs().expect("var node has VarAttributes");
                match &attrs.name {
                    Some(name) => write!(f, "var:{}{}", name, self.shape()),
                    None => write!(f, "var{}{}", attrs.id, self.shape()),
                }
            }
            kind => {
                write!(f, "{}(", kind.name())?;
                for (i, arg) in self.args().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
