//! Atom constructors.
//!
//! Affine atoms build nodes that coefficient extraction understands
//! directly; non-linear atoms build nodes the cone transform rewrites.

pub mod affine;
pub mod nonlinear;

pub use affine::{
    add, diag_mat, diag_vec, hstack, index, mul, neg, reshape, sum_entries, trace, transpose,
    vstack,
};
pub use nonlinear::{abs, norm1, p_norm, quad_over_lin};
