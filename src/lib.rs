//! zpool-create - Layout-driven storage pool creation
//!
//! Creates ZFS pools on a JBOD storage appliance from a layout file that
//! names disks by enclosure and slot.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Orchestrator                          │
//! │  layout file ─► select ─► confirm ─► rescan ─► per-pool loop   │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────┐  ┌─────────────────┐  ┌──────────────┐  │
//! │  │ Inventory Scanner │  │ Layout Resolver │  │ Pool Command │  │
//! │  │ slotmap + hddisco │─►│ + Classifier    │─►│ Builder      │  │
//! │  └───────────────────┘  └─────────────────┘  └──────────────┘  │
//! ├────────────────────────────────────────────────────────────────┤
//! │               Command Runner (sh, nmc, timeouts)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Orchestrator, prompts and pool command building
//! - [`hardware`]: Inventory discovery and device classification
//! - [`layout`]: Layout files and their resolution to devices
//! - [`command`]: External command execution
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod command;
pub mod controlplane;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod layout;

// Re-export commonly used types
pub use command::{run_checked, run_nmc, CommandRunner};

pub use controlplane::{
    ConsolePrompter, Orchestrator, OrchestratorConfig, PoolCommandBuilder, RunOutcome,
    RunSummary,
};

pub use domain::ports::{
    CommandExecutor, CommandOutput, DeviceInfo, DeviceRole, Prompter, ResolvedPool, SlotMap,
    SlotRef,
};

pub use error::{Error, ErrorKind, Result};

pub use hardware::{
    parse_hddisco, parse_slotmap, ClassifierConfig, DeviceClassifier, Inventory,
    InventoryScanner, ScannerConfig,
};

pub use layout::{LayoutConfig, LayoutResolver, PoolSpec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
