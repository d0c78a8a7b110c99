//! Hardware Discovery Module
//!
//! Collects the appliance's disk inventory from the NMC slot map and
//! hddisco.

pub mod hddisco;
pub mod scanner;
pub mod slotmap;

pub use hddisco::*;
pub use scanner::*;
pub use slotmap::*;
