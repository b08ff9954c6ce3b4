//! Non-linear convex atoms.
//!
//! These nodes are rejected by coefficient extraction; the cone transform
//! rewrites them into affine trees plus cone constraints first.

use std::sync::Arc;

use crate::expr::{Attributes, ExprKind, Expression, PNormAttributes};

/// Elementwise absolute value.
pub fn abs(x: Expression) -> Expression {
    Expression::with_args(ExprKind::Abs, vec![x], None)
}

/// p-norm of all entries. The cone transform handles only `p == 1`.
pub fn p_norm(x: Expression, p: f64) -> Expression {
    Expression::with_args(
        ExprKind::PNorm,
        vec![x],
        Some(Arc::new(Attributes::PNorm(PNormAttributes { p }))),
    )
}

/// L1 norm, `p_norm` with `p = 1`.
pub fn norm1(x: Expression) -> Expression {
    p_norm(x, 1.0)
}

/// Quadratic over linear: `||x||^2 / y` with `y` a positive scalar.
pub fn quad_over_lin(x: Expression, y: Expression) -> Expression {
    Expression::with_args(ExprKind::QuadOverLin, vec![x, y], None)
}
