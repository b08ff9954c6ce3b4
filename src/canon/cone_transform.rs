//! Linear cone transform.
//!
//! Rewrites trees containing the non-linear convex atoms (absolute value,
//! 1-norm, quadratic-over-linear) into semantically equivalent affine trees:
//! each rewrite introduces epigraph variables and appends the inequality and
//! second-order cone constraints that pin them down.

use crate::atoms::{abs, add, mul, neg, sum_entries, vstack};
use crate::constraints::{leq, soc};
use crate::error::{CanonError, Result};
use crate::expr::{constant, epi_var, scalar_epi_var, ExprKind, Expression};
use crate::problem::Problem;

/// `|x| <= t` as a pair of inequality cones: `x <= t`, `-x <= t`.
fn transform_abs(expr: &Expression, constraints: &mut Vec<Expression>) -> Expression {
    let x = expr.arg(0).clone();
    let t = epi_var(expr, "abs");
    constraints.push(leq(x.clone(), t.clone()));
    constraints.push(leq(neg(x), t.clone()));
    t
}

/// The 1-norm is `sum_entries(|x|)`; the rewrite builds the inner absolute
/// value over the argument and reuses the abs rule, so the epigraph variable
/// takes the argument's shape.
fn transform_p_norm(expr: &Expression, constraints: &mut Vec<Expression>) -> Result<Expression> {
    let p = expr.pnorm_attrs().expect("p_norm node has PNormAttributes").p;
    if p != 1.0 {
        return Err(CanonError::UnsupportedPNorm {
            p,
            expr: expr.to_string(),
        });
    }
    let inner = abs(expr.arg(0).clone());
    Ok(sum_entries(transform_abs(&inner, constraints)))
}

/// `||x||^2 / y <= t` as the second-order cone
/// `|| (y - t, 2x) ||_2 <= y + t` together with `0 <= y`.
fn transform_quad_over_lin(expr: &Expression, constraints: &mut Vec<Expression>) -> Expression {
    let x = expr.arg(0).clone();
    let y = expr.arg(1).clone();
    assert!(
        y.shape().is_scalar(),
        "quad_over_lin divisor must be scalar"
    );
    assert!(
        x.shape().is_vector(),
        "quad_over_lin numerator must be a column vector"
    );

    let t = scalar_epi_var(expr, "qol");
    constraints.push(soc(
        vstack(vec![add(y.clone(), neg(t.clone())), mul(constant(2.0), x)]),
        add(y.clone(), t.clone()),
    ));
    constraints.push(leq(constant(0.0), y));
    t
}

/// Transform one expression.
///
/// Post-order: children first, then the node is rebuilt around the
/// transformed children with its original attributes, and the rule table is
/// consulted on the original type tag. The returned expression replaces the
/// node in its parent; emitted constraints accumulate in `constraints`.
pub fn transform_expression(
    expr: &Expression,
    constraints: &mut Vec<Expression>,
) -> Result<Expression> {
    let mut linear_args = Vec::with_capacity(expr.args().len());
    for arg in expr.args() {
        linear_args.push(transform_expression(arg, constraints)?);
    }
    let output = Expression::with_args(expr.kind(), linear_args, expr.attr_handle());

    match expr.kind() {
        ExprKind::Abs => Ok(transform_abs(&output, constraints)),
        ExprKind::PNorm => transform_p_norm(&output, constraints),
        ExprKind::QuadOverLin => Ok(transform_quad_over_lin(&output, constraints)),
        _ => Ok(output),
    }
}

/// The cone-transform pass over a whole problem.
#[derive(Debug, Default)]
pub struct LinearConeTransform;

impl LinearConeTransform {
    pub fn new() -> Self {
        LinearConeTransform
    }

    /// Return an equivalent problem whose objective and constraints are
    /// affine, with the cone constraints emitted by the rewrites appended.
    ///
    /// The input constraint list is iterated while emitted constraints land
    /// in the output list, so constraints generated mid-pass are never
    /// themselves transformed as source expressions.
    pub fn transform(&self, problem: &Problem) -> Result<Problem> {
        let mut constraints = Vec::new();
        let objective = transform_expression(&problem.objective, &mut constraints)?;
        for constr in &problem.constraints {
            let transformed = transform_expression(constr, &mut constraints)?;
            constraints.push(transformed);
        }
        Ok(Problem {
            sense: problem.sense,
            objective,
            constraints,
        })
    }
}
