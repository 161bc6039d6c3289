//! # Engine Module
//!
//! The grid-search engine that turns a table of past experiments into a ranked list of
//! parameter vectors to try next.
//!
//! ## Overview
//!
//! Each pass is a pure function of the accumulated data:
//!
//! 1. [`closed_set`] groups measured experiments by canonical grid cell and collects the
//!    fitness samples observed at each cell.
//! 2. [`open_set`] walks outward from every closed cell along each parameter dimension,
//!    creating untried neighbor cells (coarse expansion) and letting nearby closed cells
//!    vote on them with their samples (fine back-propagation).
//! 3. [`ranking`] scores the open cells by mean fitness or by an upper confidence bound
//!    and returns the top candidates.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Per-campaign search radii, ranking and stop settings
//! - **State Tracking** ([`state`]) - Loop phases, step records and campaign outcomes
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Schema, data, domain and configuration failures

pub mod closed_set;
pub mod config;
pub mod error;
pub mod open_set;
pub mod progress;
pub mod ranking;
pub mod state;
