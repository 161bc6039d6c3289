use itertools::Itertools;
use std::fmt;

const KEY_SCALE: f64 = 1000.0;

/// Spacing of the grid: coordinates are kept to three decimal places.
pub const GRID_RESOLUTION: f64 = 1.0 / KEY_SCALE;

/// Largest coordinate magnitude whose scaled key is still an exact integer.
pub const MAX_COORDINATE: f64 = 9.0e12;

/// Rounds a single coordinate to three decimal places.
#[inline]
pub fn round_coordinate(value: f64) -> f64 {
    scaled(value) as f64 / KEY_SCALE
}

/// Whether `value` has a grid cell of its own. NaN, infinities and magnitudes beyond
/// [`MAX_COORDINATE`] would all collapse onto saturated keys.
#[inline]
pub fn is_on_grid(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_COORDINATE
}

#[inline]
fn scaled(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

/// Identity of a grid cell: the integer-scaled tuple of rounded coordinates.
///
/// Two vectors whose coordinates agree after rounding always produce the same key,
/// regardless of floating-point noise below the third decimal place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(Vec<i64>);

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.0
                .iter()
                .map(|&v| format!("{:.3}", v as f64 / KEY_SCALE))
                .join(", ")
        )
    }
}

/// An ordered set of synthesis parameters, one value per dimension (typically reagent
/// volumes in mL).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVector {
    values: Vec<f64>,
}

impl ParameterVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dims(&self) -> usize {
        self.values.len()
    }

    pub fn is_on_grid(&self) -> bool {
        self.values.iter().all(|&v| is_on_grid(v))
    }

    pub fn rounded(&self) -> Self {
        Self {
            values: self.values.iter().map(|&v| round_coordinate(v)).collect(),
        }
    }

    pub fn key(&self) -> CanonicalKey {
        CanonicalKey(self.values.iter().map(|&v| scaled(v)).collect())
    }

    /// Returns a rounded copy with dimension `dim` moved by `delta`.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is out of range.
    pub fn shifted(&self, dim: usize, delta: f64) -> Self {
        let mut values = self.values.clone();
        values[dim] += delta;
        Self::new(values).rounded()
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values.iter().join(", "))
    }
}
