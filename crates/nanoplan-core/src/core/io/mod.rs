//! File I/O for campaign inputs.
//!
//! - [`table_csv`] - Headered CSV files into a [`DataTable`](crate::core::models::table::DataTable).
//! - [`campaign_file`] - TOML campaign files into a
//!   [`CampaignConfig`](crate::engine::config::CampaignConfig).

pub mod campaign_file;
pub mod table_csv;
