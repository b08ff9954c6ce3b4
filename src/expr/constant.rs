//! Constant expression creation.

use std::sync::Arc;

use nalgebra::DMatrix;

use super::expression::{Attributes, ConstAttributes, ExprKind, Expression};

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expression {
    constant_dmatrix(DMatrix::from_element(1, 1, value))
}

/// Create a constant column-vector expression.
pub fn constant_vec(values: Vec<f64>) -> Expression {
    let n = values.len();
    constant_dmatrix(DMatrix::from_vec(n, 1, values))
}

/// Create a constant matrix expression from column-major data.
pub fn constant_matrix(values: Vec<f64>, rows: usize, cols: usize) -> Expression {
    constant_dmatrix(DMatrix::from_vec(rows, cols, values))
}

/// Create a constant expression from a nalgebra matrix.
pub fn constant_dmatrix(data: DMatrix<f64>) -> Expression {
    Expression::with_args(
        ExprKind::Const,
        vec![],
        Some(Arc::new(Attributes::Const(ConstAttributes { data }))),
    )
}
