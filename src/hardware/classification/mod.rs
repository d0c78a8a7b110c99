//! Hardware Classification Module
//!
//! Classifies discovered devices into log, cache and data roles.

pub mod classifier;

pub use classifier::*;
