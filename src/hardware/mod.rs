//! Hardware Module
//!
//! Provides inventory discovery and device classification for pool
//! building.

pub mod classification;
pub mod discovery;

pub use classification::*;
pub use discovery::*;
