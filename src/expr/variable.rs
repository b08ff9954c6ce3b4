//! Variable expression creation.
//!
//! Variable ids are positive and monotone for the lifetime of the process,
//! so every free variable (caller-created or auxiliary) gets a distinct id.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::expression::{Attributes, ExprKind, Expression, VarAttributes, VarId};
use super::shape::Shape;

fn next_variable_id() -> VarId {
    static NEXT_ID: AtomicI64 = AtomicI64::new(1);
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

fn make_variable(rows: usize, cols: usize, name: Option<String>) -> Expression {
    Expression::with_args(
        ExprKind::Var,
        vec![],
        Some(Arc::new(Attributes::Var(VarAttributes {
            id: next_variable_id(),
            rows,
            cols,
            name,
        }))),
    )
}

/// Create a column-vector variable of length `n`.
pub fn variable(n: usize) -> Expression {
    make_variable(n, 1, None)
}

/// Create a scalar variable.
pub fn scalar_variable() -> Expression {
    make_variable(1, 1, None)
}

/// Create a matrix variable.
pub fn matrix_variable(rows: usize, cols: usize) -> Expression {
    make_variable(rows, cols, None)
}

/// Create a named variable.
pub fn named_variable(shape: Shape, name: &str) -> Expression {
    make_variable(shape.rows(), shape.cols(), Some(name.to_string()))
}

/// Create an epigraph variable with the same shape as `parent`.
///
/// The tag keeps auxiliary naming stable across runs; the id is fresh.
pub fn epi_var(parent: &Expression, tag: &str) -> Expression {
    let shape = parent.shape();
    epi_var_with_shape(shape, tag)
}

/// Create a scalar epigraph variable for `parent`.
pub fn scalar_epi_var(_parent: &Expression, tag: &str) -> Expression {
    epi_var_with_shape(Shape::scalar(), tag)
}

fn epi_var_with_shape(shape: Shape, tag: &str) -> Expression {
    let id = next_variable_id();
    Expression::with_args(
        ExprKind::Var,
        vec![],
        Some(Arc::new(Attributes::Var(VarAttributes {
            id,
            rows: shape.rows(),
            cols: shape.cols(),
            name: Some(format!("{}:{}", tag, id)),
        }))),
    )
}
