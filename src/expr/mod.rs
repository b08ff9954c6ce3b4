//! Expression types and creation utilities.
//!
//! This module provides the immutable expression tree:
//! - `Expression` - a tagged node with ordered children and attributes
//! - `Shape` - shape information for expressions
//! - Variable creation via `variable()` and friends
//! - Constant creation via `constant()` and friends

pub mod constant;
pub mod expression;
pub mod shape;
pub mod variable;

// Re-export main types
pub use constant::{constant, constant_dmatrix, constant_matrix, constant_vec};
pub use expression::{
    Attributes, ConstAttributes, ExprKind, Expression, IndexAttributes, PNormAttributes,
    ReshapeAttributes, Slice, VarAttributes, VarId,
};
pub use shape::Shape;
pub use variable::{
    epi_var, matrix_variable, named_variable, scalar_epi_var, scalar_variable, variable,
};
