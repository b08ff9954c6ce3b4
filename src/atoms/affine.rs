//! Affine atoms and operator overloading.
//!
//! Constructors for the affine atoms plus `std::ops` overloads so trees can
//! be written as ordinary arithmetic. Every constructor checks its operand
//! shapes at construction time.

use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{
    constant, Attributes, ExprKind, Expression, IndexAttributes, ReshapeAttributes, Slice,
};

/// Elementwise addition. A scalar operand broadcasts to the other shape.
pub fn add(a: Expression, b: Expression) -> Expression {
    Expression::with_args(ExprKind::Add, vec![a, b], None)
}

/// Negation.
pub fn neg(x: Expression) -> Expression {
    Expression::with_args(ExprKind::Neg, vec![x], None)
}

/// Multiplication. Exactly one side must reduce to a constant for
/// coefficient extraction to accept the node.
pub fn mul(a: Expression, b: Expression) -> Expression {
    Expression::with_args(ExprKind::Mul, vec![a, b], None)
}

/// Sum of all entries, yielding a scalar.
pub fn sum_entries(x: Expression) -> Expression {
    Expression::with_args(ExprKind::SumEntries, vec![x], None)
}

/// Reshape to `(rows, cols)`; the element count must be preserved.
pub fn reshape(x: Expression, rows: usize, cols: usize) -> Expression {
    Expression::with_args(
        ExprKind::Reshape,
        vec![x],
        Some(Arc::new(Attributes::Reshape(ReshapeAttributes { rows, cols }))),
    )
}

/// Slice rows and columns of `x`.
pub fn index(x: Expression, row: Slice, col: Slice) -> Expression {
    Expression::with_args(
        ExprKind::Index,
        vec![x],
        Some(Arc::new(Attributes::Index(IndexAttributes { row, col }))),
    )
}

/// Matrix transpose.
pub fn transpose(x: Expression) -> Expression {
    Expression::with_args(ExprKind::Transpose, vec![x], None)
}

/// Stack expressions vertically.
pub fn vstack(args: Vec<Expression>) -> Expression {
    assert!(!args.is_empty(), "vstack requires at least one operand");
    Expression::with_args(ExprKind::Vstack, args, None)
}

/// Stack expressions horizontally.
pub fn hstack(args: Vec<Expression>) -> Expression {
    assert!(!args.is_empty(), "hstack requires at least one operand");
    Expression::with_args(ExprKind::Hstack, args, None)
}

/// Embed a vector as the diagonal of a square matrix.
pub fn diag_vec(x: Expression) -> Expression {
    Expression::with_args(ExprKind::DiagVec, vec![x], None)
}

/// Extract the diagonal of a square matrix as a vector.
pub fn diag_mat(x: Expression) -> Expression {
    Expression::with_args(ExprKind::DiagMat, vec![x], None)
}

/// Trace of a square matrix.
pub fn trace(x: Expression) -> Expression {
    assert!(x.shape().is_square(), "trace operand must be square");
    Expression::with_args(ExprKind::Trace, vec![x], None)
}

// ============================================================================
// Operator overloading
// ============================================================================

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        neg(self)
    }
}

impl Neg for &Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        neg(self.clone())
    }
}

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        add(self, rhs)
    }
}

impl Add for &Expression {
    type Output = Expression;

    fn add(self, rhs: &Expression) -> Expression {
        add(self.clone(), rhs.clone())
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        add(self, neg(rhs))
    }
}

impl Sub for &Expression {
    type Output = Expression;

    fn sub(self, rhs: &Expression) -> Expression {
        add(self.clone(), neg(rhs.clone()))
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        mul(constant(self), rhs)
    }
}

impl Mul<&Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: &Expression) -> Expression {
        mul(constant(self), rhs.clone())
    }
}
