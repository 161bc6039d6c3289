use serde::Deserialize;

/// Normalization applied to one raw measurement.
///
/// All variants are pure and expect a positive `scale`. None of them bound the result:
/// a measurement far from the target produces a negative fitness unless a
/// [`ClampPolicy`] says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "policy")]
pub enum ScoreFunction {
    /// `1 - |x - target| / scale`, for measurements that should hit a value
    /// (e.g. an LSPR peak at 600 nm).
    TargetProximity { target: f64, scale: f64 },
    /// `1 - x / scale`, for error-like measurements where zero is ideal.
    Magnitude { scale: f64 },
    /// `x / scale`, for measurements where larger is directly better.
    Ratio { scale: f64 },
}

impl ScoreFunction {
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            ScoreFunction::TargetProximity { target, scale } => 1.0 - (x - target).abs() / scale,
            ScoreFunction::Magnitude { scale } => 1.0 - x / scale,
            ScoreFunction::Ratio { scale } => x / scale,
        }
    }

    pub fn scale(&self) -> f64 {
        match *self {
            ScoreFunction::TargetProximity { scale, .. }
            | ScoreFunction::Magnitude { scale }
            | ScoreFunction::Ratio { scale } => scale,
        }
    }
}

/// What to do with negative fitness values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClampPolicy {
    /// Keep negative values as a genuine penalty.
    Unbounded,
    /// Floor every fitness sample at zero.
    AtZero,
}

impl ClampPolicy {
    #[inline]
    pub fn apply(&self, z: f64) -> f64 {
        match self {
            ClampPolicy::Unbounded => z,
            ClampPolicy::AtZero => z.max(0.0),
        }
    }
}
