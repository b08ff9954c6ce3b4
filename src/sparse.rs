//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices. All matrices
//! are compressed sparse column (CSC); flattening follows the column-major
//! convention used everywhere in the crate.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from `(row, col, value)` triplets.
///
/// Duplicates are summed together.
pub fn csc_from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    if triplets.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    let mut coo = CooMatrix::new(nrows, ncols);
    for &(row, col, val) in triplets {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }

    CscMatrix::from(&coo)
}

/// Create a CSC identity matrix.
pub fn csc_identity(n: usize) -> CscMatrix<f64> {
    CscMatrix::identity(n)
}

/// Create a dense-valued all-ones matrix in CSC form.
pub fn csc_ones(nrows: usize, ncols: usize) -> CscMatrix<f64> {
    let mut triplets = Vec::with_capacity(nrows * ncols);
    for j in 0..ncols {
        for i in 0..nrows {
            triplets.push((i, j, 1.0));
        }
    }
    csc_from_triplets(nrows, ncols, &triplets)
}

/// Create `s * identity(n)` in CSC form.
pub fn csc_scalar(s: f64, n: usize) -> CscMatrix<f64> {
    let triplets: Vec<_> = (0..n).map(|i| (i, i, s)).collect();
    csc_from_triplets(n, n, &triplets)
}

/// Add two CSC matrices of the same shape.
pub fn csc_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    assert_eq!(a.nrows(), b.nrows());
    assert_eq!(a.ncols(), b.ncols());

    let mut triplets = Vec::with_capacity(a.nnz() + b.nnz());
    for (r, c, v) in a.triplet_iter() {
        triplets.push((r, c, *v));
    }
    for (r, c, v) in b.triplet_iter() {
        triplets.push((r, c, *v));
    }
    csc_from_triplets(a.nrows(), a.ncols(), &triplets)
}

/// Multiply two CSC matrices with conforming shapes.
pub fn csc_matmul(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    assert_eq!(a.ncols(), b.nrows());

    // Gather the columns of `a` once, then scatter through the entries of `b`.
    let mut a_cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); a.ncols()];
    for (i, k, v) in a.triplet_iter() {
        a_cols[k].push((i, *v));
    }

    let mut triplets = Vec::new();
    for (k, j, bv) in b.triplet_iter() {
        for &(i, av) in &a_cols[k] {
            triplets.push((i, j, av * bv));
        }
    }
    csc_from_triplets(a.nrows(), b.ncols(), &triplets)
}

/// Column-major flatten of a dense matrix into a sparse column vector.
pub fn flatten_to_column(dense: &DMatrix<f64>) -> CscMatrix<f64> {
    let dim = dense.nrows() * dense.ncols();
    let mut triplets = Vec::new();
    for (k, v) in dense.iter().enumerate() {
        if *v != 0.0 {
            triplets.push((k, 0, *v));
        }
    }
    csc_from_triplets(dim, 1, &triplets)
}

/// Reshape a sparse column vector back into an `nrows x ncols` matrix,
/// undoing the column-major flatten.
pub fn reshape_column(col: &CscMatrix<f64>, nrows: usize, ncols: usize) -> CscMatrix<f64> {
    assert_eq!(col.ncols(), 1);
    assert_eq!(col.nrows(), nrows * ncols);

    let mut triplets = Vec::with_capacity(col.nnz());
    for (k, _, v) in col.triplet_iter() {
        triplets.push((k % nrows, k / nrows, *v));
    }
    csc_from_triplets(nrows, ncols, &triplets)
}

/// Convert a dense matrix to CSC format.
pub fn dense_to_csc(dense: &DMatrix<f64>) -> CscMatrix<f64> {
    let mut triplets = Vec::new();
    for j in 0..dense.ncols() {
        for i in 0..dense.nrows() {
            let v = dense[(i, j)];
            if v != 0.0 {
                triplets.push((i, j, v));
            }
        }
    }
    csc_from_triplets(dense.nrows(), dense.ncols(), &triplets)
}

/// Convert CSC to a dense matrix.
pub fn csc_to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (row, col, val) in sparse.triplet_iter() {
        dense[(row, col)] += *val;
    }
    dense
}
