//! Data models shared by every layer.
//!
//! - [`params`] - `ParameterVector` and the `CanonicalKey` that identifies a grid cell.
//! - [`table`] - `DataTable`, the accumulated record of experiments.

pub mod params;
pub mod table;
