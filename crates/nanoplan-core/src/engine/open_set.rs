use super::closed_set::{ClosedEntry, ClosedSet};
use super::config::{ConfigError, DimensionConfig};
use super::error::{DomainError, EngineError};
use crate::core::models::params::{CanonicalKey, GRID_RESOLUTION, ParameterVector};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};

/// Slack allowed when comparing a gap against its threshold, so that the boundary cell
/// (`k * step == threshold`) is not lost to floating-point error.
const GAP_TOLERANCE: f64 = 1e-9;

/// Smallest usable step: anything below half a grid unit rounds back onto its origin.
const MIN_STEP: f64 = GRID_RESOLUTION / 2.0;

/// Upper bound on `threshold / step` for either pass.
const MAX_OFFSETS: f64 = 1_000_000.0;

/// An untried grid cell next to at least one measured cell.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenEntry {
    pub params: ParameterVector,
    /// Samples inherited from nearby closed cells; empty until one of them votes.
    pub samples: Vec<f64>,
}

/// Untried neighbor cells, keyed by canonical grid key and kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OpenSet {
    entries: Vec<OpenEntry>,
    index: HashMap<CanonicalKey, usize>,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&OpenEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<OpenEntry>) -> Self {
        let mut open = Self::new();
        for entry in entries {
            let key = entry.params.key();
            open.index.insert(key, open.entries.len());
            open.entries.push(entry);
        }
        open
    }

    fn insert(&mut self, key: CanonicalKey, params: ParameterVector) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(OpenEntry {
            params,
            samples: Vec::new(),
        });
        true
    }

    fn extend_samples(&mut self, key: &CanonicalKey, samples: &[f64]) -> bool {
        match self.index.get(key) {
            Some(&i) => {
                self.entries[i].samples.extend_from_slice(samples);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Open cells created by the coarse pass.
    pub created: usize,
    /// Sample lists copied onto existing open cells by the fine pass.
    pub propagated: usize,
    /// Coarse directions cut short by a non-positive coordinate.
    pub rejected_non_positive: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    const BOTH: [Direction; 2] = [Direction::Up, Direction::Down];

    #[inline]
    fn signed(self, gap: f64) -> f64 {
        match self {
            Direction::Up => gap,
            Direction::Down => -gap,
        }
    }
}

fn validate(dimension: &DimensionConfig) -> Result<(), EngineError> {
    for value in [dimension.step, dimension.near_step] {
        if !(value >= MIN_STEP && value.is_finite()) {
            return Err(DomainError::ZeroStepSize {
                dimension: dimension.column.clone(),
                value,
            }
            .into());
        }
    }
    for (threshold, step, name) in [
        (dimension.threshold, dimension.step, "threshold"),
        (dimension.near_threshold, dimension.near_step, "near-threshold"),
    ] {
        let invalid = |reason: String| ConfigError::InvalidParameter {
            name: format!("{}.{}", dimension.column, name),
            reason,
        };
        if !threshold.is_finite() {
            return Err(invalid("must be finite".to_string()).into());
        }
        if threshold / step > MAX_OFFSETS {
            return Err(invalid(format!("spans more than {MAX_OFFSETS} steps")).into());
        }
    }
    Ok(())
}

/// Builds the open set around `closed`.
///
/// `dimensions[i]` configures the i-th coordinate of every parameter vector.
pub fn expand(closed: &ClosedSet, dimensions: &[DimensionConfig]) -> Result<OpenSet, EngineError> {
    expand_with_stats(closed, dimensions).map(|(open, _)| open)
}

/// Same as [`expand`], also returning pass counters.
pub fn expand_with_stats(
    closed: &ClosedSet,
    dimensions: &[DimensionConfig],
) -> Result<(OpenSet, ExpansionStats), EngineError> {
    expand_excluding(closed, dimensions, &HashSet::new())
}

/// Builds the open set around `closed`, never creating a cell listed in `excluded`.
///
/// For every closed cell and every dimension, the coarse pass steps outward by
/// `k * step` in both directions, creating up to `count_limit` new cells per direction
/// while the gap stays within `threshold`. The fine pass then steps outward by
/// `k * near_step` up to `near_threshold` and appends the closed cell's samples to every
/// open cell it lands on. The fine pass never creates cells.
///
/// Excluded cells are stepped over like closed ones: they do not count towards
/// `count_limit`, so the walk continues past them.
#[instrument(skip_all, name = "open_set_expansion")]
pub fn expand_excluding(
    closed: &ClosedSet,
    dimensions: &[DimensionConfig],
    excluded: &HashSet<CanonicalKey>,
) -> Result<(OpenSet, ExpansionStats), EngineError> {
    for dimension in dimensions {
        validate(dimension)?;
    }
    if let Some(dims) = closed.dims() {
        if dims != dimensions.len() {
            return Err(ConfigError::DimensionMismatch {
                expected: dims,
                found: dimensions.len(),
            }
            .into());
        }
    }

    let occupied = Occupied { closed, excluded };
    let mut open = OpenSet::new();
    let mut stats = ExpansionStats::default();

    for entry in closed.iter() {
        for (dim, config) in dimensions.iter().enumerate() {
            for direction in Direction::BOTH {
                coarse_expand(entry, dim, config, direction, occupied, &mut open, &mut stats);
            }
            for direction in Direction::BOTH {
                propagate_near(entry, dim, config, direction, closed, &mut open, &mut stats);
            }
        }
        debug!(
            cell = %entry.params,
            open_cells = open.len(),
            "Expanded closed cell."
        );
    }

    info!(
        closed_cells = closed.len(),
        open_cells = open.len(),
        created = stats.created,
        propagated = stats.propagated,
        rejected_non_positive = stats.rejected_non_positive,
        "Open set built."
    );
    Ok((open, stats))
}

/// Cells the coarse pass must step over: measured ones and excluded ones.
#[derive(Clone, Copy)]
struct Occupied<'a> {
    closed: &'a ClosedSet,
    excluded: &'a HashSet<CanonicalKey>,
}

impl Occupied<'_> {
    fn contains(&self, key: &CanonicalKey) -> bool {
        self.closed.contains(key) || self.excluded.contains(key)
    }
}

fn coarse_expand(
    entry: &ClosedEntry,
    dim: usize,
    config: &DimensionConfig,
    direction: Direction,
    occupied: Occupied<'_>,
    open: &mut OpenSet,
    stats: &mut ExpansionStats,
) {
    let mut created = 0;
    let mut k = 1u64;
    loop {
        let gap = k as f64 * config.step;
        if created >= config.count_limit || gap > config.threshold + GAP_TOLERANCE {
            break;
        }

        let candidate = entry.params.shifted(dim, direction.signed(gap));
        if candidate.values()[dim] <= 0.0 {
            stats.rejected_non_positive += 1;
            break;
        }
        if !candidate.is_on_grid() {
            break;
        }

        let key = candidate.key();
        if !occupied.contains(&key) && open.insert(key, candidate) {
            trace!(cell = %entry.params, dim, gap, "Created open cell.");
            created += 1;
            stats.created += 1;
        }
        k += 1;
    }
}

fn propagate_near(
    entry: &ClosedEntry,
    dim: usize,
    config: &DimensionConfig,
    direction: Direction,
    closed: &ClosedSet,
    open: &mut OpenSet,
    stats: &mut ExpansionStats,
) {
    let mut k = 1u64;
    loop {
        let gap = k as f64 * config.near_step;
        if gap > config.near_threshold + GAP_TOLERANCE {
            break;
        }

        let key = entry.params.shifted(dim, direction.signed(gap)).key();
        if !closed.contains(&key) && open.extend_samples(&key, &entry.samples) {
            stats.propagated += 1;
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(
        step: f64,
        threshold: f64,
        count_limit: usize,
        near_step: f64,
        near_threshold: f64,
    ) -> DimensionConfig {
        DimensionConfig {
            column: "volume".to_string(),
            step,
            threshold,
            count_limit,
            near_step,
            near_threshold,
        }
    }

    fn closed_from(points: &[(&[f64], &[f64])]) -> ClosedSet {
        let mut closed = ClosedSet::new();
        for (params, samples) in points {
            let v = ParameterVector::new(params.to_vec());
            for &s in *samples {
                closed.record(&v, s);
            }
        }
        closed
    }

    fn open_values(open: &OpenSet) -> Vec<Vec<f64>> {
        open.iter().map(|e| e.params.values().to_vec()).collect()
    }

    #[test]
    fn coarse_expansion_steps_out_in_both_directions() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        let open = expand(&closed, &[dim(0.1, 0.2, 2, 0.01, 0.0)]).unwrap();

        assert_eq!(
            open_values(&open),
            vec![vec![1.1], vec![1.2], vec![0.9], vec![0.8]]
        );
        assert!(open.iter().all(|e| e.samples.is_empty()));
    }

    #[test]
    fn coarse_expansion_stops_at_the_count_limit() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        let (open, stats) =
            expand_with_stats(&closed, &[dim(0.1, 0.5, 3, 0.01, 0.0)]).unwrap();

        assert_eq!(open.len(), 6);
        assert_eq!(stats.created, 6);
        assert!(open.contains(&ParameterVector::new(vec![1.3]).key()));
        assert!(!open.contains(&ParameterVector::new(vec![1.4]).key()));
        assert!(open.contains(&ParameterVector::new(vec![0.7]).key()));
        assert!(!open.contains(&ParameterVector::new(vec![0.6]).key()));
    }

    #[test]
    fn closed_collisions_do_not_occupy_a_slot() {
        let closed = closed_from(&[(&[1.0], &[0.5]), (&[1.1], &[0.6])]);
        let open = expand(&closed, &[dim(0.1, 0.3, 2, 0.01, 0.0)]).unwrap();

        let values = open_values(&open);
        assert!(values.contains(&vec![1.2]));
        assert!(values.contains(&vec![1.3]));
        assert!(!values.contains(&vec![1.0]));
        assert!(!values.contains(&vec![1.1]));
    }

    #[test]
    fn coarse_expansion_rejects_non_positive_coordinates() {
        let closed = closed_from(&[(&[0.15], &[0.5])]);
        let (open, stats) =
            expand_with_stats(&closed, &[dim(0.1, 0.3, 5, 0.01, 0.0)]).unwrap();

        let values = open_values(&open);
        assert_eq!(values, vec![vec![0.25], vec![0.35], vec![0.45], vec![0.05]]);
        assert_eq!(stats.rejected_non_positive, 1);
        assert!(open.iter().all(|e| e.params.values()[0] > 0.0));
    }

    #[test]
    fn coordinate_rounding_to_zero_is_rejected() {
        let closed = closed_from(&[(&[0.1], &[0.5])]);
        let open = expand(&closed, &[dim(0.0996, 0.0996, 1, 0.01, 0.0)]).unwrap();
        assert_eq!(open_values(&open), vec![vec![0.2]]);
    }

    #[test]
    fn fine_pass_shares_samples_with_existing_open_cells() {
        let closed = closed_from(&[(&[1.0], &[0.9])]);
        let (open, stats) =
            expand_with_stats(&closed, &[dim(0.1, 0.2, 2, 0.05, 0.1)]).unwrap();

        let at = |v: f64| open.get(&ParameterVector::new(vec![v]).key()).unwrap();
        assert_eq!(at(1.1).samples, vec![0.9]);
        assert_eq!(at(0.9).samples, vec![0.9]);
        assert!(at(1.2).samples.is_empty());
        assert!(at(0.8).samples.is_empty());
        assert_eq!(stats.propagated, 2);
        assert!(!open.contains(&ParameterVector::new(vec![1.05]).key()));
    }

    #[test]
    fn fine_pass_never_creates_cells() {
        let closed = closed_from(&[(&[1.0, 2.0], &[0.9]), (&[1.5, 2.5], &[0.4])]);
        let no_coarse = dim(0.1, 0.5, 0, 0.05, 0.5);
        let open = expand(&closed, &[no_coarse.clone(), no_coarse]).unwrap();
        assert!(open.is_empty());
    }

    #[test]
    fn later_closed_cells_vote_on_cells_created_earlier() {
        let closed = closed_from(&[(&[1.0], &[0.5]), (&[1.2], &[0.7, 0.9])]);
        let open = expand(&closed, &[dim(0.1, 0.2, 2, 0.1, 0.1)]).unwrap();

        let between = open.get(&ParameterVector::new(vec![1.1]).key()).unwrap();
        assert_eq!(between.samples, vec![0.5, 0.7, 0.9]);
        let above = open.get(&ParameterVector::new(vec![1.3]).key()).unwrap();
        assert_eq!(above.samples, vec![0.7, 0.9]);
    }

    #[test]
    fn expansion_keeps_open_and_closed_disjoint() {
        let closed = closed_from(&[
            (&[0.10, 0.20], &[0.1]),
            (&[0.12, 0.20], &[0.2]),
            (&[0.10, 0.22], &[0.3]),
            (&[0.14, 0.24], &[0.4, 0.5]),
        ]);
        let d = dim(0.02, 0.04, 2, 0.01, 0.02);
        let open = expand(&closed, &[d.clone(), d]).unwrap();

        assert!(!open.is_empty());
        for entry in open.iter() {
            assert!(!closed.contains(&entry.params.key()));
            assert!(entry.params.values().iter().all(|&v| v > 0.0));
        }
    }

    #[test]
    fn zero_step_size_fails_fast() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        let result = expand(&closed, &[dim(0.0, 0.2, 2, 0.01, 0.1)]);
        assert!(matches!(
            result,
            Err(EngineError::Domain {
                source: DomainError::ZeroStepSize { .. }
            })
        ));

        let result = expand(&closed, &[dim(0.1, 0.2, 2, 0.0, 0.1)]);
        assert!(matches!(
            result,
            Err(EngineError::Domain {
                source: DomainError::ZeroStepSize { .. }
            })
        ));
    }

    #[test]
    fn steps_below_grid_resolution_are_rejected() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        for config in [dim(1e-10, 1.0, 2, 0.01, 0.1), dim(0.1, 0.2, 2, 1e-10, 1.0)] {
            assert!(matches!(
                expand(&closed, &[config]),
                Err(EngineError::Domain {
                    source: DomainError::ZeroStepSize { .. }
                })
            ));
        }
    }

    #[test]
    fn thresholds_spanning_too_many_steps_are_rejected() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        let result = expand(&closed, &[dim(0.001, 1e4, 1, 0.01, 0.1)]);
        assert!(matches!(
            result,
            Err(EngineError::Config {
                source: ConfigError::InvalidParameter { name, .. }
            }) if name == "volume.threshold"
        ));
    }

    #[test]
    fn excluded_cells_are_stepped_over_without_using_a_slot() {
        let closed = closed_from(&[(&[1.0], &[0.5])]);
        let excluded: HashSet<CanonicalKey> =
            [ParameterVector::new(vec![1.1]).key()].into_iter().collect();
        let (open, stats) =
            expand_excluding(&closed, &[dim(0.1, 0.3, 1, 0.1, 0.1)], &excluded).unwrap();

        assert_eq!(open_values(&open), vec![vec![1.2], vec![0.9]]);
        assert_eq!(stats.created, 2);
        assert_eq!(
            open.get(&ParameterVector::new(vec![0.9]).key()).unwrap().samples,
            vec![0.5]
        );
    }

    #[test]
    fn dimension_count_must_match_the_closed_set() {
        let closed = closed_from(&[(&[1.0, 2.0], &[0.5])]);
        let result = expand(&closed, &[dim(0.1, 0.2, 2, 0.01, 0.1)]);
        assert!(matches!(
            result,
            Err(EngineError::Config {
                source: ConfigError::DimensionMismatch {
                    expected: 2,
                    found: 1
                }
            })
        ));
    }

    #[test]
    fn empty_closed_set_expands_to_empty_open_set() {
        let open = expand(&ClosedSet::new(), &[dim(0.1, 0.2, 2, 0.01, 0.1)]).unwrap();
        assert!(open.is_empty());
    }
}
