//! Error types for zpool-create
//!
//! Every fatal condition of a run is represented here and propagated up to
//! `main`, which alone decides the process exit status.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for the pool creator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Command Execution Errors
    // =========================================================================
    #[error("command timeout of {}s exceeded: \"{command}\"", .elapsed.as_secs())]
    Timeout { command: String, elapsed: Duration },

    #[error("command execution failed \"{command}\": {source}")]
    Execution {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command execution failed \"{command}\" (exit code {code}): {}", .output.as_deref().unwrap_or(""))]
    NonZeroExit {
        command: String,
        code: i32,
        output: Option<String>,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Cannot open the config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse the config file {}: {reason}", .path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown layout '{name}', expected one of: {}", .available.join(", "))]
    UnknownLayout { name: String, available: Vec<String> },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid configuration file: {0}")]
    Validation(String),

    #[error("Invalid {role} device {device} {vendor} {product}")]
    InvalidDevice {
        role: String,
        device: String,
        vendor: String,
        product: String,
    },

    #[error("No device in enclosure {enclosure} slot {slot}")]
    SlotNotFound { enclosure: String, slot: u32 },

    #[error("Device not found in discovery output: {device}")]
    DeviceNotFound { device: String },

    #[error("Device {device} has no '{attribute}' attribute")]
    MissingAttribute { device: String, attribute: String },

    #[error("Device {device} is used more than once ({context})")]
    DuplicateDevice { device: String, context: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Cannot parse {source_name} output line {line_no}: {reason}")]
    Parse {
        source_name: String,
        line_no: usize,
        reason: String,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Input error: {0}")]
    Input(String),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// External command exceeded its allotted duration
    Timeout,
    /// External command could not be launched or communicated with
    Execution,
    /// External command ran but reported failure
    NonZeroExit,
    /// Layout file unreadable or malformed
    Config,
    /// Layout does not match the discovered hardware
    Validation,
    /// Inventory command output did not have the expected shape
    Parse,
    /// Operator input could not be read
    Input,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Execution { .. } | Error::Io(_) => ErrorKind::Execution,
            Error::NonZeroExit { .. } => ErrorKind::NonZeroExit,
            Error::ConfigRead { .. } | Error::ConfigParse { .. } | Error::Configuration(_) => {
                ErrorKind::Config
            }
            Error::UnknownLayout { .. }
            | Error::Validation(_)
            | Error::InvalidDevice { .. }
            | Error::SlotNotFound { .. }
            | Error::DeviceNotFound { .. }
            | Error::MissingAttribute { .. }
            | Error::DuplicateDevice { .. } => ErrorKind::Validation,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Input(_) => ErrorKind::Input,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether the operator should review the layout file against the slot map
    pub fn needs_layout_review(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidDevice { .. }
                | Error::SlotNotFound { .. }
                | Error::DeviceNotFound { .. }
                | Error::MissingAttribute { .. }
                | Error::DuplicateDevice { .. }
        )
    }
}

/// Result type alias for the pool creator
pub type Result<T> = std::result::Result<T, Error>;
