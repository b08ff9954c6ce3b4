//! Error types for conic-canon.

use thiserror::Error;

/// Error type for canonicalization passes.
///
/// Every variant is fatal to the pass that raised it and carries a compact
/// rendering of the offending expression for diagnosis.
#[derive(Debug, Error)]
pub enum CanonError {
    /// Inner dimensions disagree while composing coefficient blocks.
    #[error("shape mismatch: cannot compose {lhs_rows}x{lhs_cols} with {rhs_rows}x{rhs_cols} in {expr}")]
    ShapeMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
        expr: String,
    },

    /// Multiplication where neither operand reduces to a constant.
    #[error("multiplying two non-constant operands in {expr}")]
    NonAffineMul { expr: String },

    /// Coefficient extraction reached a type tag with no builder.
    #[error("no linear coefficients for {expr}")]
    UnknownAtom { expr: String },

    /// p-norm with an unsupported exponent.
    #[error("p-norm supports only p = 1, got p = {p} in {expr}")]
    UnsupportedPNorm { p: f64, expr: String },
}

/// Result type for canonicalization passes.
pub type Result<T> = std::result::Result<T, CanonError>;
