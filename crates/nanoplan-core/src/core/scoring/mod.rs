//! Fitness scoring.
//!
//! Raw spectral measurements (peak wavelength, peak ratio, curve error) live on very
//! different scales. The functions in [`score`] map a single measurement onto a
//! normalized fitness value where higher is better, and [`objective`] combines one or
//! more of them into the per-experiment fitness sample used by the search.

pub mod objective;
pub mod score;
