// src/lib.rs
// Library interface for payscout
pub mod cli;
pub mod config;
pub mod crypto;
pub mod endpoint;
pub mod extractor;
pub mod geo;
pub mod merge;
pub mod normalize;
pub mod notifier;
pub mod report;
pub mod runner;
pub mod session;
pub mod sink;
pub mod types;
