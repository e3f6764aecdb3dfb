//! Library crate for net-diag-rs exposing reusable modules.
pub mod collector;
pub mod config;
pub mod netinfo;
pub mod probe;
pub mod progress;
pub mod report;
pub mod server;
