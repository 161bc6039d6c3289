//! # Nanoplan Core Library
//!
//! Experiment planning for nanomaterial synthesis campaigns. Given past experiments
//! (reagent volumes and the measured optical-spectrum peak properties they produced),
//! the library proposes the next batch of reagent volumes most likely to hit a target
//! peak position or ratio.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ParameterVector`, `CanonicalKey`,
//!   `DataTable`), the fitness functions that normalize raw measurements (`scoring`), and
//!   I/O utilities for tables and campaign files.
//!
//! - **[`engine`]: The Logic Core.** The grid search itself: building the closed set of
//!   measured cells, expanding it into an open set of untried neighbors, and ranking those
//!   neighbors by mean fitness or by an upper confidence bound.
//!
//! - **[`workflows`]: The Public API.** The experiment loop that repeats
//!   build → expand → rank → experiment → append until the target is observed or the step
//!   budget runs out, plus an executor that replays a historical table in place of a
//!   physical lab.

pub mod core;
pub mod engine;
pub mod workflows;
