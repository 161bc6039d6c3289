//! # Core Module
//!
//! Fundamental building blocks for synthesis-campaign planning.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Parameter vectors, canonical grid keys, and the
//!   tabular experiment record.
//! - **Fitness Scoring** ([`scoring`]) - Normalization of raw spectral measurements into
//!   bounded fitness values, and weighted objectives over several measurements.
//! - **File I/O** ([`io`]) - Loading experiment tables from CSV and campaign
//!   configurations from TOML.

pub mod io;
pub mod models;
pub mod scoring;
