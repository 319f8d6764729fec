//! Command-line interface for the loader

pub mod commands;
pub mod error;
