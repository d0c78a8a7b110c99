//! Domain Ports - Core types and trait definitions for the pool creator
//!
//! The traits define the boundaries between the pool-building logic and the
//! outside world: the shell that runs inventory and creation commands, and the
//! operator answering prompts. Adapters implement these traits.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// =============================================================================
// Slot Map
// =============================================================================

/// Physical location of a disk: enclosure identifier and slot number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef(pub String, pub u32);

impl SlotRef {
    pub fn new(enclosure: impl Into<String>, slot: u32) -> Self {
        Self(enclosure.into(), slot)
    }

    pub fn enclosure(&self) -> &str {
        &self.0
    }

    pub fn slot(&self) -> u32 {
        self.1
    }
}

impl std::fmt::Display for SlotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// Enclosure -> slot -> device identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMap {
    enclosures: BTreeMap<String, BTreeMap<u32, String>>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a device at a location.
    ///
    /// Returns the device previously recorded at that location, if any.
    pub fn insert(
        &mut self,
        enclosure: impl Into<String>,
        slot: u32,
        device: impl Into<String>,
    ) -> Option<String> {
        self.enclosures
            .entry(enclosure.into())
            .or_default()
            .insert(slot, device.into())
    }

    /// Device identifier at a location
    pub fn get(&self, enclosure: &str, slot: u32) -> Option<&str> {
        self.enclosures
            .get(enclosure)
            .and_then(|slots| slots.get(&slot))
            .map(String::as_str)
    }

    /// Device identifier at a location, failing if the slot is empty
    pub fn resolve(&self, slot: &SlotRef) -> Result<&str> {
        self.get(slot.enclosure(), slot.slot())
            .ok_or_else(|| Error::SlotNotFound {
                enclosure: slot.enclosure().to_string(),
                slot: slot.slot(),
            })
    }

    pub fn enclosures(&self) -> impl Iterator<Item = &str> {
        self.enclosures.keys().map(String::as_str)
    }

    /// Total number of mapped slots
    pub fn len(&self) -> usize {
        self.enclosures.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Discovery Attributes
// =============================================================================

pub const ATTR_VENDOR: &str = "vendor";
pub const ATTR_PRODUCT: &str = "product";
pub const ATTR_IS_SSD: &str = "is_ssd";

/// Attribute name -> value for one device
pub type DeviceAttributes = BTreeMap<String, String>;

/// Device identifier -> discovery attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    devices: BTreeMap<String, DeviceAttributes>,
}

impl DeviceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a device section, keeping any attributes already recorded
    pub fn add_device(&mut self, device: impl Into<String>) -> &mut DeviceAttributes {
        self.devices.entry(device.into()).or_default()
    }

    pub fn set_attribute(
        &mut self,
        device: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.add_device(device).insert(name.into(), value.into());
    }

    pub fn attributes(&self, device: &str) -> Result<&DeviceAttributes> {
        self.devices.get(device).ok_or_else(|| Error::DeviceNotFound {
            device: device.to_string(),
        })
    }

    /// Attribute value, failing if the device or attribute is unknown
    pub fn attribute(&self, device: &str, name: &str) -> Result<&str> {
        self.attributes(device)?
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingAttribute {
                device: device.to_string(),
                attribute: name.to_string(),
            })
    }

    /// Vendor and product for diagnostics, with placeholders for gaps
    pub fn describe(&self, device: &str) -> (String, String) {
        let lookup = |name| {
            self.attribute(device, name)
                .map(str::to_string)
                .unwrap_or_else(|_| "unknown".to_string())
        };
        (lookup(ATTR_VENDOR), lookup(ATTR_PRODUCT))
    }

    pub fn contains(&self, device: &str) -> bool {
        self.devices.contains_key(device)
    }

    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

// =============================================================================
// Device Roles
// =============================================================================

/// Role a device plays inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    /// Member of a redundancy group
    Vdev,
    /// Read cache (SSD, not a log device)
    Cache,
    /// Write-intent log
    Log,
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::Vdev => write!(f, "vdev"),
            DeviceRole::Cache => write!(f, "cache"),
            DeviceRole::Log => write!(f, "log"),
        }
    }
}

// =============================================================================
// Resolved Pool
// =============================================================================

/// A pool specification with every slot resolved to a device identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPool {
    pub name: String,
    pub redundancy: String,
    pub vdevs: Vec<Vec<String>>,
    pub cache: Option<Vec<String>>,
    pub log: Option<Vec<Vec<String>>>,
}

impl ResolvedPool {
    /// Every device in the pool, tagged with its role, in layout order
    pub fn devices(&self) -> impl Iterator<Item = (DeviceRole, &str)> {
        let logs = self.log.iter().flatten().flatten();
        let cache = self.cache.iter().flatten();
        let vdevs = self.vdevs.iter().flatten();

        logs.map(|d| (DeviceRole::Log, d.as_str()))
            .chain(cache.map(|d| (DeviceRole::Cache, d.as_str())))
            .chain(vdevs.map(|d| (DeviceRole::Vdev, d.as_str())))
    }
}

// =============================================================================
// Command Execution
// =============================================================================

/// Result of running an external command to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    /// Combined stdout/stderr, trimmed; `None` when nothing was printed
    pub output: Option<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell commands
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command line, killing it if it outlives `timeout`
    async fn execute(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput>;
}

// =============================================================================
// Operator Interaction
// =============================================================================

/// Asks the operator questions
#[async_trait]
pub trait Prompter: Send {
    /// Pick one of `choices`, returning its index
    async fn select(&mut self, question: &str, choices: &[String]) -> Result<usize>;

    /// Yes/no question
    async fn confirm(&mut self, question: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_slotmap_resolve() {
        let mut slotmap = SlotMap::new();
        slotmap.insert("J1", 1, "c0t0d0");
        slotmap.insert("J1", 2, "c0t1d0");
        slotmap.insert("J2", 1, "c1t0d0");

        assert_eq!(slotmap.resolve(&SlotRef::new("J1", 2)).unwrap(), "c0t1d0");
        assert_eq!(slotmap.resolve(&SlotRef::new("J2", 1)).unwrap(), "c1t0d0");
        assert_eq!(slotmap.len(), 3);
        assert_eq!(slotmap.enclosures().collect::<Vec<_>>(), vec!["J1", "J2"]);

        assert_matches!(
            slotmap.resolve(&SlotRef::new("J1", 3)),
            Err(Error::SlotNotFound { enclosure, slot: 3 }) if enclosure == "J1"
        );
        assert_matches!(
            slotmap.resolve(&SlotRef::new("J9", 1)),
            Err(Error::SlotNotFound { .. })
        );
    }

    #[test]
    fn test_device_info_lookup() {
        let mut info = DeviceInfo::new();
        info.set_attribute("c0t0d0", ATTR_VENDOR, "STEC");
        info.set_attribute("c0t0d0", ATTR_PRODUCT, "ZeusRAM");

        assert_eq!(info.attribute("c0t0d0", ATTR_PRODUCT).unwrap(), "ZeusRAM");
        assert_matches!(
            info.attribute("c0t0d0", ATTR_IS_SSD),
            Err(Error::MissingAttribute { .. })
        );
        assert_matches!(
            info.attribute("c9t9d9", ATTR_PRODUCT),
            Err(Error::DeviceNotFound { .. })
        );
        assert_eq!(
            info.describe("c9t9d9"),
            ("unknown".to_string(), "unknown".to_string())
        );
    }

    #[test]
    fn test_slot_ref_from_json_pair() {
        let slot: SlotRef = serde_json::from_str(r#"["J1", 4]"#).unwrap();
        assert_eq!(slot, SlotRef::new("J1", 4));
        assert_eq!(slot.to_string(), "J1:4");
    }

    #[test]
    fn test_resolved_pool_devices_order() {
        let pool = ResolvedPool {
            name: "tank".into(),
            redundancy: "mirror".into(),
            vdevs: vec![vec!["a".into(), "b".into()]],
            cache: Some(vec!["c".into()]),
            log: Some(vec![vec!["d".into(), "e".into()]]),
        };

        let devices: Vec<_> = pool.devices().collect();
        assert_eq!(
            devices,
            vec![
                (DeviceRole::Log, "d"),
                (DeviceRole::Log, "e"),
                (DeviceRole::Cache, "c"),
                (DeviceRole::Vdev, "a"),
                (DeviceRole::Vdev, "b"),
            ]
        );
    }
}
