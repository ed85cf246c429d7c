//! testbridge CLI
//!
//! Command-line front end for the testbridge conversion engine.

pub mod commands;
pub mod config;
pub mod output;
