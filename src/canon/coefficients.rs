//! Linear coefficient extraction.
//!
//! Given a purely affine expression tree, computes for each referenced
//! variable a sparse matrix such that the column-major flattening of the
//! expression equals the sum of (matrix x variable-vector) terms plus a
//! constant column. The result maps variable ids to coefficient matrices,
//! with the constant column under [`CONST_COEFFICIENT_ID`].
//!
//! Every builder assumes column-major vectorization: element `(i, j)` of an
//! `(R x C)` value occupies flat index `j * R + i`. Deviating breaks
//! compatibility with downstream solvers.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use nalgebra_sparse::CscMatrix;

use crate::error::{CanonError, Result};
use crate::expr::{ExprKind, Expression, VarId};
use crate::sparse::{
    csc_add, csc_from_triplets, csc_identity, csc_matmul, csc_ones, csc_scalar, flatten_to_column,
    reshape_column,
};

/// Reserved key for the constant column of a coefficient map.
pub const CONST_COEFFICIENT_ID: VarId = -1;

/// Mapping from variable id (or [`CONST_COEFFICIENT_ID`]) to a sparse
/// coefficient matrix of shape `(dim(expr), var_dim)`. The constant entry
/// has a single column.
pub type CoeffMap = HashMap<VarId, CscMatrix<f64>>;

/// A map is constant iff its only entry is the constant column.
pub fn is_constant(coeffs: &CoeffMap) -> bool {
    coeffs.len() == 1 && coeffs.contains_key(&CONST_COEFFICIENT_ID)
}

// ============================================================================
// Per-atom coefficient builders
// ============================================================================
//
// Each builder returns one block per argument; block `i` has shape
// `(dim(expr), dim(expr.arg(i)))`.

fn add_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    expr.args()
        .iter()
        .map(|arg| {
            // A scalar operand broadcasts through a ones column.
            if arg.dim() == 1 {
                csc_ones(expr.dim(), 1)
            } else {
                csc_identity(expr.dim())
            }
        })
        .collect()
}

fn neg_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    vec![csc_scalar(-1.0, expr.dim())]
}

fn sum_entries_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    vec![csc_ones(1, expr.arg(0).dim())]
}

fn reshape_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    vec![csc_identity(expr.dim())]
}

fn trace_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    let rows = expr.arg(0).shape().rows();
    let triplets: Vec<_> = (0..rows).map(|i| (0, i * rows + i, 1.0)).collect();
    vec![csc_from_triplets(1, rows * rows, &triplets)]
}

/// Selector blocks scattering each argument into the stacked result.
fn stack_coefficients(expr: &Expression, vertical: bool) -> Vec<CscMatrix<f64>> {
    let mut coeffs = Vec::with_capacity(expr.args().len());
    let mut offset = 0;
    let expr_rows = expr.shape().rows();

    for arg in expr.args() {
        let arg_rows = arg.shape().rows();
        let arg_cols = arg.shape().cols();

        // Vertical stacking interleaves the columns of the operands;
        // horizontal stacking lays the operands out contiguously.
        let (column_offset, offset_increment) = if vertical {
            (expr_rows, arg_rows)
        } else {
            (arg_rows, arg_rows * arg_cols)
        };

        let mut triplets = Vec::with_capacity(arg.dim());
        for i in 0..arg_rows {
            for j in 0..arg_cols {
                let row_idx = i + j * column_offset + offset;
                let col_idx = i + j * arg_rows;
                triplets.push((row_idx, col_idx, 1.0));
            }
        }

        coeffs.push(csc_from_triplets(expr.dim(), arg.dim(), &triplets));
        offset += offset_increment;
    }
    coeffs
}

fn vstack_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    stack_coefficients(expr, true)
}

fn hstack_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    stack_coefficients(expr, false)
}

fn index_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    let rows = expr.arg(0).shape().rows();
    let cols = expr.arg(0).shape().cols();

    // An empty selection still carries the correct column count.
    if expr.dim() == 0 {
        return vec![CscMatrix::zeros(0, rows * cols)];
    }

    let attrs = expr.index_attrs().expect("index node has IndexAttributes");
    let (row_start, row_stop) = attrs.row.resolve(rows);
    let row_step = attrs.row.step;
    let (col_start, col_stop) = attrs.col.resolve(cols);
    let col_step = attrs.col.step;

    // Columns are the outer loop so the selection order matches the
    // column-major flattening of the result.
    let mut triplets = Vec::with_capacity(expr.dim());
    let mut counter = 0;
    let mut col = col_start;
    loop {
        if col < 0 || col >= cols as isize {
            break;
        }
        let mut row = row_start;
        loop {
            if row < 0 || row >= rows as isize {
                break;
            }
            triplets.push((counter, col as usize * rows + row as usize, 1.0));
            counter += 1;
            row += row_step;
            if (row_step > 0 && row >= row_stop) || (row_step < 0 && row < row_stop) {
                break;
            }
        }
        col += col_step;
        if (col_step > 0 && col >= col_stop) || (col_step < 0 && col < col_stop) {
            break;
        }
    }

    vec![csc_from_triplets(expr.dim(), rows * cols, &triplets)]
}

fn transpose_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    let rows = expr.shape().rows();
    let cols = expr.shape().cols();

    let mut triplets = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            triplets.push((rows * j + i, i * cols + j, 1.0));
        }
    }
    vec![csc_from_triplets(rows * cols, rows * cols, &triplets)]
}

fn diag_vec_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    let rows = expr.shape().rows();
    let triplets: Vec<_> = (0..rows).map(|i| (i * rows + i, i, 1.0)).collect();
    vec![csc_from_triplets(rows * rows, rows, &triplets)]
}

fn diag_mat_coefficients(expr: &Expression) -> Vec<CscMatrix<f64>> {
    let rows = expr.shape().rows();
    let triplets: Vec<_> = (0..rows).map(|i| (i, i * rows + i, 1.0)).collect();
    vec![csc_from_triplets(rows, rows * rows, &triplets)]
}

/// Left-constant multiplication: for `C * E` with `C` of shape `(p, q)` and
/// the result `(p, n)`, the block is `n` copies of `C` along the diagonal of
/// a `(p*n, q*n)` matrix.
fn left_mul_coefficients(expr: &Expression, block: &CscMatrix<f64>) -> CscMatrix<f64> {
    let block_rows = block.nrows();
    let block_cols = block.ncols();
    let num_blocks = expr.shape().cols();

    let mut triplets = Vec::with_capacity(num_blocks * block.nnz());
    for curr_block in 0..num_blocks {
        let start_i = curr_block * block_rows;
        let start_j = curr_block * block_cols;
        for (i, j, v) in block.triplet_iter() {
            triplets.push((start_i + i, start_j + j, *v));
        }
    }
    csc_from_triplets(num_blocks * block_rows, num_blocks * block_cols, &triplets)
}

/// Right-constant multiplication: for `E * C` with `C` of shape `(p, q)` and
/// the result `(m, q)`, each non-zero `C[r, c]` occupies an `m x m` identity
/// block at block position `(c, r)` of an `(m*q, m*p)` grid.
fn right_mul_coefficients(expr: &Expression, constant: &CscMatrix<f64>) -> CscMatrix<f64> {
    let rows = constant.nrows();
    let cols = constant.ncols();
    let n = expr.shape().rows();

    let mut triplets = Vec::with_capacity(n * constant.nnz());
    for (r, c, v) in constant.triplet_iter() {
        let row_start = c * n;
        let col_start = r * n;
        for i in 0..n {
            triplets.push((row_start + i, col_start + i, *v));
        }
    }
    csc_from_triplets(cols * n, rows * n, &triplets)
}

/// Dispatch table over the affine atoms with per-argument blocks.
/// `Const`, `Var`, and `Mul` are special-cased by the driver; anything else
/// is the unknown-atom fatal case.
fn coefficient_blocks(expr: &Expression) -> Option<Vec<CscMatrix<f64>>> {
    match expr.kind() {
        ExprKind::Add => Some(add_coefficients(expr)),
        ExprKind::Neg => Some(neg_coefficients(expr)),
        ExprKind::SumEntries => Some(sum_entries_coefficients(expr)),
        ExprKind::Reshape => Some(reshape_coefficients(expr)),
        ExprKind::Vstack => Some(vstack_coefficients(expr)),
        ExprKind::Hstack => Some(hstack_coefficients(expr)),
        ExprKind::Index => Some(index_coefficients(expr)),
        ExprKind::Transpose => Some(transpose_coefficients(expr)),
        ExprKind::DiagVec => Some(diag_vec_coefficients(expr)),
        ExprKind::DiagMat => Some(diag_mat_coefficients(expr)),
        ExprKind::Trace => Some(trace_coefficients(expr)),
        _ => None,
    }
}

// ============================================================================
// Extraction driver
// ============================================================================

/// Accumulate `lhs * M` into `result` for every `(id, M)` in `rhs`, summing
/// entries that share an id.
fn multiply_by_constant(
    lhs: &CscMatrix<f64>,
    rhs: &CoeffMap,
    result: &mut CoeffMap,
    expr: &Expression,
) -> Result<()> {
    for (id, coeff) in rhs {
        if lhs.ncols() != coeff.nrows() {
            return Err(CanonError::ShapeMismatch {
                lhs_rows: lhs.nrows(),
                lhs_cols: lhs.ncols(),
                rhs_rows: coeff.nrows(),
                rhs_cols: coeff.ncols(),
                expr: expr.to_string(),
            });
        }
        let value = csc_matmul(lhs, coeff);
        match result.entry(*id) {
            Entry::Occupied(mut e) => {
                let sum = csc_add(e.get(), &value);
                e.insert(sum);
            }
            Entry::Vacant(e) => {
                e.insert(value);
            }
        }
    }
    Ok(())
}

/// Recover the matrix form of a constant operand from its flattened column
/// and build the multiplication block.
///
/// Scalar promotion: a scalar constant scales the whole operand through
/// `s * I`, and a scalar operand scales the constant through its flattened
/// column. The left/right block forms apply only when both sides are
/// matrix-shaped.
fn mul_block(expr: &Expression, arg_index: usize, coeffs: &CoeffMap) -> CscMatrix<f64> {
    let arg = expr.arg(arg_index);
    let other = expr.arg(1 - arg_index);
    let column = &coeffs[&CONST_COEFFICIENT_ID];

    if arg.dim() == 1 && expr.dim() > 1 {
        let value = column.values().first().copied().unwrap_or(0.0);
        return csc_scalar(value, expr.dim());
    }
    if other.dim() == 1 && arg.dim() > 1 {
        return column.clone();
    }

    let constant = reshape_column(column, arg.shape().rows(), arg.shape().cols());
    if arg_index == 0 {
        left_mul_coefficients(expr, &constant)
    } else {
        right_mul_coefficients(expr, &constant)
    }
}

/// Compute the coefficient map of an affine expression.
///
/// Post-order over the tree: leaves produce their own map, interior atoms
/// compose their per-argument blocks with the maps of their children.
/// Multiplication requires exactly one constant side; unknown type tags
/// (including untransformed non-linear atoms) are fatal.
pub fn get_coefficients(expr: &Expression) -> Result<CoeffMap> {
    let mut coeffs = CoeffMap::new();

    match expr.kind() {
        ExprKind::Const => {
            let attrs = expr.const_attrs().expect("const node has ConstAttributes");
            coeffs.insert(CONST_COEFFICIENT_ID, flatten_to_column(&attrs.data));
        }
        ExprKind::Var => {
            let id = expr.variable_id().expect("var node has VarAttributes");
            coeffs.insert(id, csc_identity(expr.dim()));
        }
        ExprKind::Mul => {
            // Binary operator with exactly one constant side.
            assert_eq!(expr.args().len(), 2, "mul takes exactly two operands");
            let lhs_coeffs = get_coefficients(expr.arg(0))?;
            let rhs_coeffs = get_coefficients(expr.arg(1))?;

            if is_constant(&lhs_coeffs) {
                let block = mul_block(expr, 0, &lhs_coeffs);
                multiply_by_constant(&block, &rhs_coeffs, &mut coeffs, expr)?;
            } else if is_constant(&rhs_coeffs) {
                let block = mul_block(expr, 1, &rhs_coeffs);
                multiply_by_constant(&block, &lhs_coeffs, &mut coeffs, expr)?;
            } else {
                return Err(CanonError::NonAffineMul {
                    expr: expr.to_string(),
                });
            }
        }
        _ => {
            let blocks = coefficient_blocks(expr).ok_or_else(|| CanonError::UnknownAtom {
                expr: expr.to_string(),
            })?;
            for (block, arg) in blocks.iter().zip(expr.args()) {
                let arg_coeffs = get_coefficients(arg)?;
                multiply_by_constant(block, &arg_coeffs, &mut coeffs, expr)?;
            }
        }
    }

    Ok(coeffs)
}
