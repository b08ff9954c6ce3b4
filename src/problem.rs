//! Problem definition.
//!
//! A `Problem` bundles an optimization sense, an objective expression, and a
//! list of constraint expressions. The canonicalization passes never
//! interpret the sense; it is copied through unchanged.

use std::collections::HashMap;

use crate::expr::{Expression, Shape, VarId};

/// Optimization sense. Opaque to the canonicalization passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The optimization sense.
    pub sense: Sense,
    /// The objective expression.
    pub objective: Expression,
    /// Constraint expressions.
    pub constraints: Vec<Expression>,
}

impl Problem {
    /// Create a problem.
    pub fn new(sense: Sense, objective: Expression, constraints: Vec<Expression>) -> Self {
        Problem {
            sense,
            objective,
            constraints,
        }
    }

    /// All variable ids referenced by the problem, sorted and deduplicated.
    pub fn variables(&self) -> Vec<VarId> {
        let mut ids: Vec<VarId> = self.variable_shapes().into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    /// All variables referenced by the problem with their shapes, sorted by id.
    pub fn variable_shapes(&self) -> Vec<(VarId, Shape)> {
        let mut shapes: HashMap<VarId, Shape> = HashMap::new();
        collect_variable_shapes(&self.objective, &mut shapes);
        for c in &self.constraints {
            collect_variable_shapes(c, &mut shapes);
        }
        let mut result: Vec<_> = shapes.into_iter().collect();
        result.sort_by_key(|(id, _)| *id);
        result
    }
}

fn collect_variable_shapes(expr: &Expression, shapes: &mut HashMap<VarId, Shape>) {
    if let Some(id) = expr.variable_id() {
        shapes.insert(id, expr.shape());
    }
    for arg in expr.args() {
        collect_variable_shapes(arg, shapes);
    }
}
