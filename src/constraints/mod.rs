//! Constraint-expression constructors.
//!
//! Constraints are expression nodes like any other: `Leq` for elementwise
//! inequality cones and `Soc` for second-order cones. The cone transform
//! emits them while rewriting non-linear atoms, and callers attach them to a
//! [`crate::problem::Problem`].

use crate::expr::{ExprKind, Expression};

/// Elementwise inequality `lhs <= rhs`. A scalar side broadcasts.
pub fn leq(lhs: Expression, rhs: Expression) -> Expression {
    Expression::with_args(ExprKind::Leq, vec![lhs, rhs], None)
}

/// Second-order cone constraint `||vec||_2 <= bound`.
///
/// `vec` must be a column vector and `bound` a scalar.
pub fn soc(vec: Expression, bound: Expression) -> Expression {
    assert!(vec.shape().is_vector(), "soc vector side must be a column vector");
    assert!(bound.shape().is_scalar(), "soc bound must be scalar");
    Expression::with_args(ExprKind::Soc, vec![vec, bound], None)
}

/// Check whether a node is a constraint rather than a value expression.
pub fn is_constraint(expr: &Expression) -> bool {
    matches!(expr.kind(), ExprKind::Leq | ExprKind::Soc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, variable, Shape};

    #[test]
    fn test_leq_broadcast() {
        let x = variable(3);
        let c = leq(x, constant(1.0));
        assert_eq!(c.shape(), Shape::vector(3));
        assert!(is_constraint(&c));
    }

    #[test]
    fn test_soc_shape() {
        let v = variable(3);
        let b = variable(1);
        let c = soc(v, b);
        assert_eq!(c.shape(), Shape::scalar());
        assert!(is_constraint(&c));
    }

    #[test]
    #[should_panic]
    fn test_soc_rejects_matrix_vector() {
        let m = crate::expr::matrix_variable(2, 2);
        let b = variable(1);
        soc(m, b);
    }
}
