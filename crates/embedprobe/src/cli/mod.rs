//! Command handlers.

pub mod config;
pub mod models;
pub mod report;
pub mod run;
