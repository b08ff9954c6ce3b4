//! Shared test helpers: a reference evaluator for affine expression trees
//! and a coefficient-map evaluator to check extracted coefficients against.
#![allow(dead_code)]

use std::collections::HashMap;

use approx::assert_relative_eq;
use conic_canon::prelude::*;
use conic_canon::sparse::csc_to_dense;
use nalgebra::DMatrix;

/// Variable assignment for evaluation.
pub type Assignment = HashMap<VarId, DMatrix<f64>>;

fn resolve(bound: isize, len: usize) -> isize {
    if bound < 0 {
        bound + len as isize
    } else {
        bound
    }
}

/// Indices a slice selects from an axis of length `len`, in order.
pub fn slice_indices(s: &Slice, len: usize) -> Vec<usize> {
    let start = resolve(s.start, len);
    let stop = resolve(s.stop, len);
    let n = len as isize;
    let mut out = Vec::new();
    let mut i = start;
    loop {
        if i < 0 || i >= n {
            break;
        }
        out.push(i as usize);
        i += s.step;
        if (s.step > 0 && i >= stop) || (s.step < 0 && i < stop) {
            break;
        }
    }
    out
}

/// Numerically evaluate an affine expression under an assignment.
pub fn eval(expr: &Expression, sigma: &Assignment) -> DMatrix<f64> {
    let shape = expr.shape();
    match expr.kind() {
        ExprKind::Const => expr.const_attrs().unwrap().data.clone(),
        ExprKind::Var => sigma[&expr.variable_id().unwrap()].clone(),
        ExprKind::Add => {
            let mut out = DMatrix::zeros(shape.rows(), shape.cols());
            for arg in expr.args() {
                let v = eval(arg, sigma);
                if v.nrows() == 1 && v.ncols() == 1 && !shape.is_scalar() {
                    let s = v[(0, 0)];
                    out = out.map(|e| e + s);
                } else {
                    out += &v;
                }
            }
            out
        }
        ExprKind::Neg => -eval(expr.arg(0), sigma),
        ExprKind::Mul => {
            let a = eval(expr.arg(0), sigma);
            let b = eval(expr.arg(1), sigma);
            if a.len() == 1 {
                a[(0, 0)] * b
            } else if b.len() == 1 {
                b[(0, 0)] * a
            } else {
                &a * &b
            }
        }
        ExprKind::SumEntries => DMatrix::from_element(1, 1, eval(expr.arg(0), sigma).sum()),
        ExprKind::Reshape => {
            let v = eval(expr.arg(0), sigma);
            let data: Vec<f64> = v.iter().cloned().collect();
            DMatrix::from_vec(shape.rows(), shape.cols(), data)
        }
        ExprKind::Index => {
            let v = eval(expr.arg(0), sigma);
            let attrs = expr.index_attrs().expect("index node has IndexAttributes");
            let rows = slice_indices(&attrs.row, v.nrows());
            let cols = slice_indices(&attrs.col, v.ncols());
            // Column-outer enumeration matches the column-major layout of
            // the result.
            let mut data = Vec::with_capacity(rows.len() * cols.len());
            for &c in &cols {
                for &r in &rows {
                    data.push(v[(r, c)]);
                }
            }
            DMatrix::from_vec(shape.rows(), shape.cols(), data)
        }
        ExprKind::Transpose => eval(expr.arg(0), sigma).transpose(),
        ExprKind::DiagVec => {
            let v = eval(expr.arg(0), sigma);
            let n = v.nrows();
            DMatrix::from_fn(n, n, |i, j| if i == j { v[(i, 0)] } else { 0.0 })
        }
        ExprKind::DiagMat => {
            let m = eval(expr.arg(0), sigma);
            DMatrix::from_fn(m.nrows(), 1, |i, _| m[(i, i)])
        }
        ExprKind::Trace => {
            let m = eval(expr.arg(0), sigma);
            DMatrix::from_element(1, 1, (0..m.nrows()).map(|i| m[(i, i)]).sum())
        }
        ExprKind::Vstack => {
            let mut out = DMatrix::zeros(shape.rows(), shape.cols());
            let mut off = 0;
            for arg in expr.args() {
                let v = eval(arg, sigma);
                out.view_mut((off, 0), (v.nrows(), v.ncols())).copy_from(&v);
                off += v.nrows();
            }
            out
        }
        ExprKind::Hstack => {
            let mut out = DMatrix::zeros(shape.rows(), shape.cols());
            let mut off = 0;
            for arg in expr.args() {
                let v = eval(arg, sigma);
                out.view_mut((0, off), (v.nrows(), v.ncols())).copy_from(&v);
                off += v.ncols();
            }
            out
        }
        kind => panic!("eval does not handle {:?}", kind),
    }
}

/// Column-major flatten of a dense matrix.
pub fn flatten(m: &DMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from_vec(m.len(), 1, m.iter().cloned().collect())
}

/// Evaluate a coefficient map: sum of coefficient-times-assignment products
/// plus the constant column.
pub fn coeff_eval(coeffs: &CoeffMap, sigma: &Assignment, dim: usize) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(dim, 1);
    for (id, m) in coeffs {
        let dense = csc_to_dense(m);
        if *id == CONST_COEFFICIENT_ID {
            out += &dense;
        } else {
            out += dense * flatten(&sigma[id]);
        }
    }
    out
}

/// Check that extracted coefficients reproduce the evaluator on `expr`.
pub fn assert_coefficients_match_eval(expr: &Expression, sigma: &Assignment) {
    let coeffs = get_coefficients(expr).expect("coefficient extraction failed");
    let direct = flatten(&eval(expr, sigma));
    let via_coeffs = coeff_eval(&coeffs, sigma, expr.dim());
    assert_eq!(direct.nrows(), via_coeffs.nrows(), "for {}", expr);
    assert_relative_eq!(direct, via_coeffs, epsilon = 1e-10);
}

/// Compare two coefficient maps for equality up to dense round-off.
pub fn assert_same_coefficients(a: &CoeffMap, b: &CoeffMap) {
    assert_eq!(a.len(), b.len(), "maps have different key sets");
    for (id, ma) in a {
        let mb = b.get(id).unwrap_or_else(|| panic!("missing id {}", id));
        let da = csc_to_dense(ma);
        let db = csc_to_dense(mb);
        assert_eq!(da.nrows(), db.nrows(), "id {}", id);
        assert_eq!(da.ncols(), db.ncols(), "id {}", id);
        assert_relative_eq!(da, db, epsilon = 1e-12);
    }
}
