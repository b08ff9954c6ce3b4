//! # conic-canon
//!
//! A canonicalization engine for convex optimization problems.
//!
//! conic-canon transforms an expression tree describing a convex problem
//! into an equivalent problem in standard conic form, ready for a downstream
//! conic solver:
//!
//! 1. The **linear cone transform** rewrites non-linear convex atoms
//!    (absolute value, 1-norm, quadratic-over-linear) into affine trees plus
//!    auxiliary epigraph variables constrained by inequality and
//!    second-order cones.
//! 2. **Coefficient extraction** maps each affine expression to sparse
//!    coefficient matrices, one per referenced variable plus a constant
//!    column, under column-major vectorization.
//!
//! ## Quick start
//!
//! ```
//! use conic_canon::prelude::*;
//!
//! // minimize sum(|x|) for a 3-vector x
//! let x = variable(3);
//! let problem = Problem::new(Sense::Minimize, sum_entries(abs(x)), vec![]);
//!
//! // Rewrite into an affine problem plus cone constraints...
//! let conic = LinearConeTransform::new().transform(&problem)?;
//!
//! // ...then pull the sparse coefficients off the new objective.
//! let coeffs = get_coefficients(&conic.objective)?;
//! assert_eq!(coeffs.len(), 1);
//! # Ok::<(), conic_canon::CanonError>(())
//! ```
//!
//! ## Conventions
//!
//! - Shapes are `(rows, cols)`; scalars are `(1, 1)`.
//! - Values flatten column-major: element `(i, j)` of an `(R x C)` value
//!   occupies flat index `j * R + i`. Every coefficient builder follows this
//!   convention; it is what downstream solvers consume.
//! - Expressions are immutable and cheap to clone; trees may share subtrees.
//!
//! The engine assumes callers follow disciplined convex programming: it does
//! not verify convexity, and multiplication nodes must have exactly one
//! constant side by the time coefficients are extracted.

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod error;
pub mod expr;
pub mod problem;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```
/// use conic_canon::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        constant, constant_dmatrix, constant_matrix, constant_vec, epi_var, matrix_variable,
        named_variable, scalar_epi_var, scalar_variable, variable, Attributes, ExprKind,
        Expression, Shape, Slice, VarId,
    };

    // Atoms
    pub use crate::atoms::{
        abs, add, diag_mat, diag_vec, hstack, index, mul, neg, norm1, p_norm, quad_over_lin,
        reshape, sum_entries, trace, transpose, vstack,
    };

    // Constraints
    pub use crate::constraints::{is_constraint, leq, soc};

    // Problem
    pub use crate::problem::{Problem, Sense};

    // Canonicalization passes
    pub use crate::canon::{
        get_coefficients, is_constant, transform_expression, CoeffMap, LinearConeTransform,
        CONST_COEFFICIENT_ID,
    };

    // Errors
    pub use crate::error::{CanonError, Result};
}

// Re-export main types at crate root
pub use canon::{get_coefficients, CoeffMap, LinearConeTransform, CONST_COEFFICIENT_ID};
pub use error::{CanonError, Result};
pub use expr::Expression;
pub use problem::{Problem, Sense};
