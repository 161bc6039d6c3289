use super::score::{ClampPolicy, ScoreFunction};
use crate::core::models::table::{DataTable, TableError};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveTerm {
    pub column: String,
    pub function: ScoreFunction,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

/// Per-experiment fitness: `sum(weight_i * clamp(z_i))` over the measurement columns.
///
/// Spectra carry several peak properties (position, height ratio, width). Most
/// campaigns score a single one, which is what [`Objective::single`] builds.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    terms: Vec<ObjectiveTerm>,
    clamp: ClampPolicy,
}

impl Objective {
    pub fn new(terms: Vec<ObjectiveTerm>, clamp: ClampPolicy) -> Self {
        Self { terms, clamp }
    }

    pub fn single(column: impl Into<String>, function: ScoreFunction, clamp: ClampPolicy) -> Self {
        Self {
            terms: vec![ObjectiveTerm {
                column: column.into(),
                function,
                weight: 1.0,
            }],
            clamp,
        }
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.clamp
    }

    pub fn fitness(&self, table: &DataTable, row: usize) -> Result<f64, TableError> {
        self.terms.iter().try_fold(0.0, |acc, term| {
            let x = table.number(row, &term.column)?;
            Ok(acc + term.weight * self.clamp.apply(term.function.evaluate(x)))
        })
    }
}
