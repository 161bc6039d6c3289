use super::campaign::ExperimentExecutor;
use crate::core::models::params::{CanonicalKey, ParameterVector};
use crate::core::models::table::DataTable;
use crate::engine::error::EngineError;
use crate::engine::ranking::Candidate;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Answers proposals from a table of past experiments.
///
/// Each proposed cell is looked up by its rounded parameters; every historical row in
/// that cell is returned, so replicates come back together. Cells the table never
/// visited produce no rows.
#[derive(Debug, Clone)]
pub struct TableReplay {
    table: DataTable,
    parameters: Vec<String>,
    index: HashMap<CanonicalKey, Vec<usize>>,
}

impl TableReplay {
    pub fn new(table: DataTable, parameters: &[String]) -> Result<Self, EngineError> {
        for column in parameters {
            table.column_index(column)?;
        }

        let mut index: HashMap<CanonicalKey, Vec<usize>> = HashMap::new();
        let mut skipped = 0usize;
        for row in 0..table.len() {
            match table.numbers(row, parameters).map(ParameterVector::new) {
                Ok(params) if params.is_on_grid() => {
                    index.entry(params.key()).or_default().push(row)
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Ignoring historical rows without usable parameters.");
        }
        debug!(rows = table.len(), cells = index.len(), "Indexed replay table.");

        Ok(Self {
            table,
            parameters: parameters.to_vec(),
            index,
        })
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Number of distinct grid cells the table covers.
    pub fn cell_count(&self) -> usize {
        self.index.len()
    }

    /// Draws a random starting table: `near` rows whose `column` lies strictly within
    /// `threshold` of `target`, followed by `far` rows strictly further away.
    ///
    /// Rows without a numeric `column` value, and rows whose parameters are not on the
    /// grid, are never drawn.
    pub fn seed<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        column: &str,
        target: f64,
        threshold: f64,
        near: usize,
        far: usize,
    ) -> Result<DataTable, EngineError> {
        self.table.column_index(column)?;

        let mut order: Vec<usize> = (0..self.table.len()).collect();
        order.shuffle(rng);

        let mut near_rows = Vec::with_capacity(near);
        let mut far_rows = Vec::with_capacity(far);
        for row in order {
            let Ok(value) = self.table.number(row, column) else {
                continue;
            };
            if !self.is_indexed(row) {
                continue;
            }
            let distance = (value - target).abs();
            if distance < threshold && near_rows.len() < near {
                near_rows.push(row);
            } else if distance > threshold && far_rows.len() < far {
                far_rows.push(row);
            }
        }

        if near_rows.len() < near || far_rows.len() < far {
            return Err(EngineError::Data(format!(
                "cannot seed {near} near and {far} far rows on '{column}': only {} near and {} far available",
                near_rows.len(),
                far_rows.len()
            )));
        }

        near_rows.extend(far_rows);
        info!(near, far, column, "Seeded campaign from replay table.");
        Ok(self.table.select(&near_rows)?)
    }

    fn is_indexed(&self, row: usize) -> bool {
        self.table
            .numbers(row, &self.parameters)
            .is_ok_and(|values| ParameterVector::new(values).is_on_grid())
    }

    fn rows_for(&self, params: &ParameterVector) -> &[usize] {
        self.index
            .get(&params.key())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl ExperimentExecutor for TableReplay {
    fn execute(
        &mut self,
        step: u64,
        candidates: &[Candidate],
        parameters: &[String],
    ) -> Result<DataTable, EngineError> {
        if parameters != self.parameters.as_slice() {
            return Err(EngineError::Executor {
                step,
                message: format!(
                    "replay table is keyed on [{}] but the campaign asked for [{}]",
                    self.parameters.join(", "),
                    parameters.join(", ")
                ),
            });
        }

        let mut rows = Vec::new();
        for candidate in candidates {
            let matched = self.rows_for(&candidate.params);
            if matched.is_empty() {
                warn!(step, cell = %candidate.params, "No historical measurement for proposed cell.");
            }
            rows.extend_from_slice(matched);
        }
        debug!(step, candidates = candidates.len(), rows = rows.len(), "Replayed measurements.");
        Ok(self.table.select(&rows)?)
    }
}
