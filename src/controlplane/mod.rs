//! Control Plane Module
//!
//! Coordinates a pool creation run: operator prompts, command building and
//! the orchestrator that ties discovery, resolution and creation together.

pub mod orchestrator;
pub mod pool_command;
pub mod prompt;

pub use orchestrator::*;
pub use pool_command::*;
pub use prompt::*;
