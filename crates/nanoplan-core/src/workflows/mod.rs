//! # Workflows Module
//!
//! Top-level entry points that tie the engine to the outside world.
//!
//! ## Architecture
//!
//! - **Campaign Workflow** ([`campaign`]) - The experiment loop: plan a batch, hand it to
//!   an [`ExperimentExecutor`](campaign::ExperimentExecutor), append the measurements and
//!   repeat until the target is observed or the step budget runs out.
//! - **Table Replay** ([`replay`]) - An executor that answers proposals from a historical
//!   table, for benchmarking a configuration against data already collected.

pub mod campaign;
pub mod replay;
