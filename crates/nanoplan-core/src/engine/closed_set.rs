use super::error::EngineError;
use crate::core::models::params::{CanonicalKey, MAX_COORDINATE, ParameterVector};
use crate::core::models::table::DataTable;
use crate::core::scoring::objective::Objective;
use std::collections::HashMap;
use tracing::{info, instrument, trace};

/// A grid cell with at least one physical measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedEntry {
    pub params: ParameterVector,
    /// One fitness sample per experiment that landed on this cell, in input order.
    pub samples: Vec<f64>,
}

/// All measured cells, keyed by canonical grid key and kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ClosedSet {
    entries: Vec<ClosedEntry>,
    index: HashMap<CanonicalKey, usize>,
}

impl ClosedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fitness sample at the cell containing `params`.
    pub fn record(&mut self, params: &ParameterVector, fitness: f64) {
        let key = params.key();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].samples.push(fitness),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(ClosedEntry {
                    params: params.rounded(),
                    samples: vec![fitness],
                });
            }
        }
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&ClosedEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClosedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.entries.iter().map(|e| e.samples.len()).sum()
    }

    /// Dimension count shared by every entry, or `None` for an empty set.
    pub fn dims(&self) -> Option<usize> {
        self.entries.first().map(|e| e.params.dims())
    }
}

/// Builds the closed set from every row of `table`.
///
/// Each row contributes exactly one fitness sample, computed by `objective` from the
/// row's measurement columns, to the cell identified by its `param_columns` values.
#[instrument(skip_all, name = "closed_set_build")]
pub fn build(
    table: &DataTable,
    param_columns: &[String],
    objective: &Objective,
) -> Result<ClosedSet, EngineError> {
    for column in param_columns {
        table.column_index(column)?;
    }
    for term in objective.terms() {
        table.column_index(&term.column)?;
    }

    let mut closed = ClosedSet::new();
    for row in 0..table.len() {
        let params = ParameterVector::new(table.numbers(row, param_columns)?);
        if !params.is_on_grid() {
            return Err(EngineError::Data(format!(
                "row {row}: parameters {params} exceed the grid range of ±{MAX_COORDINATE}"
            )));
        }
        let fitness = objective.fitness(table, row)?;
        trace!(row, params = %params, fitness, "Recording experiment.");
        closed.record(&params, fitness);
    }

    info!(
        rows = table.len(),
        cells = closed.len(),
        "Closed set built."
    );
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::table::Cell;
    use crate::core::io::table_csv::read_table;
    use crate::core::scoring::score::{ClampPolicy, ScoreFunction};
    use crate::engine::ranking::mean;

    const EPS: f64 = 1e-12;

    fn magnitude_objective(column: &str) -> Objective {
        Objective::single(
            column,
            ScoreFunction::Magnitude { scale: 100.0 },
            ClampPolicy::Unbounded,
        )
    }

    fn params() -> Vec<String> {
        vec!["volume".to_string()]
    }

    #[test]
    fn replicate_rows_accumulate_samples_on_one_cell() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![1.0.into(), 10.0.into()]).unwrap();
        t.push_row(vec![1.0.into(), 20.0.into()]).unwrap();

        let closed = build(&t, &params(), &magnitude_objective("error")).unwrap();

        assert_eq!(closed.len(), 1);
        let entry = closed.iter().next().unwrap();
        assert_eq!(entry.params.values(), &[1.0]);
        assert_eq!(entry.samples.len(), 2);
        assert!((entry.samples[0] - 0.9).abs() < EPS);
        assert!((entry.samples[1] - 0.8).abs() < EPS);
        assert!((mean(&entry.samples).unwrap() - 0.85).abs() < EPS);
    }

    #[test]
    fn rows_differing_below_precision_share_a_cell() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![(0.1 + 0.2).into(), 10.0.into()]).unwrap();
        t.push_row(vec![0.3.into(), 30.0.into()]).unwrap();
        t.push_row(vec![0.4.into(), 30.0.into()]).unwrap();

        let closed = build(&t, &params(), &magnitude_objective("error")).unwrap();

        assert_eq!(closed.len(), 2);
        assert_eq!(closed.sample_count(), 3);
        let cell = closed
            .get(&ParameterVector::new(vec![0.3]).key())
            .unwrap();
        assert_eq!(cell.params.values(), &[0.3]);
        assert_eq!(cell.samples.len(), 2);
    }

    #[test]
    fn row_order_does_not_change_the_set_of_cells() {
        let rows = [(0.1, 5.0), (0.2, 15.0), (0.1, 25.0)];
        let mut forward = DataTable::new(["volume", "error"]).unwrap();
        let mut backward = DataTable::new(["volume", "error"]).unwrap();
        for &(v, e) in &rows {
            forward.push_row(vec![v.into(), e.into()]).unwrap();
        }
        for &(v, e) in rows.iter().rev() {
            backward.push_row(vec![v.into(), e.into()]).unwrap();
        }

        let a = build(&forward, &params(), &magnitude_objective("error")).unwrap();
        let b = build(&backward, &params(), &magnitude_objective("error")).unwrap();

        assert_eq!(a.len(), b.len());
        for entry in a.iter() {
            let other = b.get(&entry.params.key()).unwrap();
            let (x, y) = (mean(&entry.samples), mean(&other.samples));
            assert!((x.unwrap() - y.unwrap()).abs() < EPS);
        }
    }

    #[test]
    fn missing_parameter_column_is_a_schema_error() {
        let mut t = DataTable::new(["seed", "error"]).unwrap();
        t.push_row(vec![1.0.into(), 10.0.into()]).unwrap();

        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Schema(_))));
    }

    #[test]
    fn missing_target_column_is_a_schema_error_even_for_empty_tables() {
        let t = DataTable::new(["volume"]).unwrap();
        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Schema(_))));
    }

    #[test]
    fn non_numeric_target_is_a_data_error() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![1.0.into(), Cell::Text("lost".to_string())])
            .unwrap();

        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(msg)) if msg.contains("lost")));
    }

    #[test]
    fn nan_parameter_is_a_data_error() {
        let t = read_table("volume,error\nNaN,10\n".as_bytes()).unwrap();
        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(msg)) if msg.contains("NaN")));
    }

    #[test]
    fn nan_target_is_a_data_error() {
        let t = read_table("volume,error\n1.0,NaN\n".as_bytes()).unwrap();
        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(_))));
    }

    #[test]
    fn non_finite_numbers_built_in_code_are_data_errors() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![Cell::Number(f64::INFINITY), 10.0.into()])
            .unwrap();
        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(_))));
    }

    #[test]
    fn parameters_beyond_the_grid_range_are_data_errors() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![1e20.into(), 10.0.into()]).unwrap();
        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(msg)) if msg.contains("grid range")));
    }

    #[test]
    fn empty_parameter_cell_is_a_data_error() {
        let mut t = DataTable::new(["volume", "error"]).unwrap();
        t.push_row(vec![Cell::Empty, 10.0.into()]).unwrap();

        let result = build(&t, &params(), &magnitude_objective("error"));
        assert!(matches!(result, Err(EngineError::Data(_))));
    }
}
