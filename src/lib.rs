//! checkcore - the checking engine of a monitoring system.
//!
//! Turns measurements plus per-host history into monitoring verdicts: a
//! persistent value store for rates and averages, level evaluation against
//! fixed or predictive thresholds, and aggregation of clustered services.

pub mod api;
pub mod checking;
pub mod cluster;
pub mod config;
pub mod db;
pub mod legacy;
pub mod levels;
pub mod plugins;
pub mod prediction;
pub mod scheduler;
pub mod value_store;
