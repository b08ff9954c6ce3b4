//! Canonicalization passes.
//!
//! Two passes turn an arbitrary convex expression tree into standard conic
//! form:
//! - [`cone_transform`] rewrites non-linear convex atoms into affine trees
//!   plus cone constraints;
//! - [`coefficients`] extracts per-variable sparse coefficient matrices from
//!   the resulting affine trees.

pub mod coefficients;
pub mod cone_transform;

pub use coefficients::{get_coefficients, is_constant, CoeffMap, CONST_COEFFICIENT_ID};
pub use cone_transform::{transform_expression, LinearConeTransform};
