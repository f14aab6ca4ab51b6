//! Combat extraction pipeline and the analytics behind its dashboard.
//!
//! The `etl` binary logs in to the combat API, pulls every combat and pokemon
//! record, joins names onto the combats and writes two CSV tables. The
//! `dashboard` binary reads those tables back and renders rankings, a speed
//! distribution and a type matchup matrix in the terminal.

pub mod analytics;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod table;
pub mod transform;
pub mod types;
