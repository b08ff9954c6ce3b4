//! Cone transform: rewrite scenarios and end-to-end checks.

mod common;

use std::collections::HashMap;

use conic_canon::prelude::*;
use conic_canon::sparse::csc_to_dense;
use nalgebra::DMatrix;

use common::{coeff_eval, eval, flatten, Assignment};

/// Structural equality up to node reconstruction: type tags, shapes,
/// variable ids, and children must agree.
fn assert_same_structure(a: &Expression, b: &Expression) {
    assert_eq!(a.kind(), b.kind(), "{} vs {}", a, b);
    assert_eq!(a.shape(), b.shape(), "{} vs {}", a, b);
    assert_eq!(a.variable_id(), b.variable_id(), "{} vs {}", a, b);
    assert_eq!(a.args().len(), b.args().len(), "{} vs {}", a, b);
    for (x, y) in a.args().iter().zip(b.args()) {
        assert_same_structure(x, y);
    }
}

#[test]
fn test_sum_of_abs_rewrite() {
    // minimize sum(|x|): the transform introduces a 3-vector t with
    // x <= t and -x <= t, and the objective becomes sum(t).
    let x = variable(3);
    let problem = Problem::new(Sense::Minimize, sum_entries(abs(x.clone())), vec![]);

    let out = LinearConeTransform::new().transform(&problem).unwrap();
    assert_eq!(out.constraints.len(), 2);
    assert_eq!(out.objective.kind(), ExprKind::SumEntries);

    let t = out.objective.arg(0);
    assert_eq!(t.kind(), ExprKind::Var);
    assert_eq!(t.shape(), Shape::vector(3));
    let t_id = t.variable_id().unwrap();
    assert_ne!(Some(t_id), x.variable_id());

    // Coefficient extraction on the rewritten objective: {t -> [1, 1, 1]}.
    let coeffs = get_coefficients(&out.objective).unwrap();
    assert_eq!(coeffs.len(), 1);
    assert_eq!(
        csc_to_dense(&coeffs[&t_id]),
        DMatrix::from_element(1, 3, 1.0)
    );

    // Both constraints bound x elementwise by t.
    for c in &out.constraints {
        assert_eq!(c.kind(), ExprKind::Leq);
        assert_eq!(c.arg(1).variable_id(), Some(t_id));
    }
}

#[test]
fn test_norm1_rewrite_matches_sum_of_abs() {
    let x = variable(4);
    let mut constraints = Vec::new();
    let out = transform_expression(&norm1(x), &mut constraints).unwrap();

    assert_eq!(out.kind(), ExprKind::SumEntries);
    let t = out.arg(0);
    assert_eq!(t.shape(), Shape::vector(4));
    assert_eq!(constraints.len(), 2);
}

#[test]
fn test_quad_over_lin_rewrite() {
    // quad_over_lin(x, y): scalar t, SOC on vstack(y - t, 2x) with bound
    // y + t, and 0 <= y.
    let x = variable(2);
    let y = scalar_variable();
    let problem = Problem::new(
        Sense::Minimize,
        quad_over_lin(x.clone(), y.clone()),
        vec![],
    );

    let out = LinearConeTransform::new().transform(&problem).unwrap();
    assert_eq!(out.objective.kind(), ExprKind::Var);
    assert_eq!(out.objective.shape(), Shape::scalar());
    let t_id = out.objective.variable_id().unwrap();

    assert_eq!(out.constraints.len(), 2);
    let cone = &out.constraints[0];
    assert_eq!(cone.kind(), ExprKind::Soc);

    let stacked = cone.arg(0);
    assert_eq!(stacked.kind(), ExprKind::Vstack);
    assert_eq!(stacked.shape(), Shape::vector(3));
    // First entry is y - t.
    let head = stacked.arg(0);
    assert_eq!(head.kind(), ExprKind::Add);
    assert_eq!(head.arg(0).variable_id(), y.variable_id());
    assert_eq!(head.arg(1).kind(), ExprKind::Neg);
    assert_eq!(head.arg(1).arg(0).variable_id(), Some(t_id));
    // Second entry is 2 * x.
    let tail = stacked.arg(1);
    assert_eq!(tail.kind(), ExprKind::Mul);
    assert_eq!(tail.arg(1).variable_id(), x.variable_id());

    let bound = cone.arg(1);
    assert_eq!(bound.kind(), ExprKind::Add);
    assert_eq!(bound.arg(0).variable_id(), y.variable_id());
    assert_eq!(bound.arg(1).variable_id(), Some(t_id));

    let nonneg = &out.constraints[1];
    assert_eq!(nonneg.kind(), ExprKind::Leq);
    assert_eq!(nonneg.arg(0).kind(), ExprKind::Const);
    assert_eq!(nonneg.arg(1).variable_id(), y.variable_id());
}

#[test]
fn test_affine_problem_is_fixed_point() {
    let x = variable(3);
    let a = constant_matrix(vec![1.0, 0.0, 2.0, 1.0, -1.0, 3.0], 2, 3);
    let problem = Problem::new(
        Sense::Maximize,
        sum_entries(mul(a, x.clone())),
        vec![leq(x, constant(1.0))],
    );

    let out = LinearConeTransform::new().transform(&problem).unwrap();
    assert_eq!(out.sense, Sense::Maximize);
    assert_eq!(out.constraints.len(), problem.constraints.len());
    assert_same_structure(&out.objective, &problem.objective);
    assert_same_structure(&out.constraints[0], &problem.constraints[0]);
}

#[test]
fn test_nested_abs_transforms_bottom_up() {
    // |(|x|)| rewrites the inner node first; the outer rule then binds the
    // inner epigraph variable.
    let x = variable(2);
    let mut constraints = Vec::new();
    let out = transform_expression(&abs(abs(x)), &mut constraints).unwrap();

    assert_eq!(out.kind(), ExprKind::Var);
    assert_eq!(constraints.len(), 4);
    // The outer pair of constraints bounds the inner epigraph variable.
    let inner_t = constraints[0].arg(1).variable_id().unwrap();
    assert_eq!(constraints[2].arg(0).variable_id(), Some(inner_t));
}

#[test]
fn test_p_norm_other_than_one_is_fatal() {
    let x = variable(3);
    let problem = Problem::new(Sense::Minimize, p_norm(x, 2.0), vec![]);
    let err = LinearConeTransform::new().transform(&problem).unwrap_err();
    assert!(matches!(err, CanonError::UnsupportedPNorm { .. }));
}

#[test]
fn test_rewrite_preserves_objective_value_at_tight_point() {
    // At t = |x| the rewritten problem reproduces the original objective
    // value and satisfies every emitted constraint.
    let x = variable(3);
    let problem = Problem::new(Sense::Minimize, sum_entries(abs(x.clone())), vec![]);
    let out = LinearConeTransform::new().transform(&problem).unwrap();

    let x_val = DMatrix::from_vec(3, 1, vec![1.0, -2.0, 3.0]);
    let t_val = x_val.map(f64::abs);

    let t_id = out.objective.arg(0).variable_id().unwrap();
    let mut sigma: Assignment = HashMap::new();
    sigma.insert(x.variable_id().unwrap(), x_val);
    sigma.insert(t_id, t_val);

    // Objective value matches |1| + |-2| + |3|.
    let objective = eval(&out.objective, &sigma);
    assert_eq!(objective[(0, 0)], 6.0);

    // Each leq constraint holds elementwise at the tight point.
    for c in &out.constraints {
        let lhs = eval(c.arg(0), &sigma);
        let rhs = eval(c.arg(1), &sigma);
        for i in 0..lhs.nrows() {
            assert!(
                lhs[(i, 0)] <= rhs[(i, 0)] + 1e-12,
                "constraint {} violated at row {}",
                c,
                i
            );
        }
    }

    // The extracted coefficients of the new objective agree with direct
    // evaluation under the same assignment.
    let coeffs = get_coefficients(&out.objective).unwrap();
    let via_coeffs = coeff_eval(&coeffs, &sigma, out.objective.dim());
    assert_eq!(flatten(&objective), via_coeffs);
}

#[test]
fn test_constraint_rewrites_do_not_retransform_emitted_constraints() {
    // A problem whose only constraint contains an abs: the emitted epigraph
    // constraints precede the transformed original, and nothing is
    // transformed twice.
    let x = variable(2);
    let problem = Problem::new(
        Sense::Minimize,
        sum_entries(x.clone()),
        vec![leq(norm1(x), constant(1.0))],
    );

    let out = LinearConeTransform::new().transform(&problem).unwrap();
    assert_eq!(out.constraints.len(), 3);
    assert_eq!(out.constraints[0].kind(), ExprKind::Leq);
    assert_eq!(out.constraints[1].kind(), ExprKind::Leq);

    // The transformed original is last: sum(t) <= 1.
    let rewritten = &out.constraints[2];
    assert_eq!(rewritten.kind(), ExprKind::Leq);
    assert_eq!(rewritten.arg(0).kind(), ExprKind::SumEntries);
    assert_eq!(rewritten.arg(1).kind(), ExprKind::Const);

    // Everything in the output extracts cleanly as affine.
    for c in &out.constraints {
        for side in c.args() {
            get_coefficients(side).unwrap();
        }
    }
}
