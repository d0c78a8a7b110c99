//! Layout Module
//!
//! Layout files and their resolution against the discovered hardware.

pub mod config;
pub mod resolver;

pub use config::*;
pub use resolver::*;
