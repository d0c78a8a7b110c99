//! Command Module
//!
//! Execution of external commands: plain shell commands and NMC
//! management-plane commands.

pub mod runner;

pub use runner::*;
