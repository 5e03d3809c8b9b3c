pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod reporting;
pub mod stats;
pub mod storage;
