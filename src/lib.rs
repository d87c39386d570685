// lib.rs - library exports for the CLI and integration tests

pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod models;
