//! Inventory Scanner
//!
//! Rescans the attached JBODs and collects the two inventories a pool layout
//! is resolved against: the LUN slot map and the hddisco device attributes.

use super::hddisco::parse_hddisco;
use super::slotmap::parse_slotmap;
use crate::command::{run_checked, run_nmc};
use crate::domain::ports::{CommandExecutor, DeviceInfo, SlotMap};
use crate::error::Result;
use std::time::Duration;
use tracing::info;

// =============================================================================
// Scanner Configuration
// =============================================================================

/// Commands and timeouts used for inventory collection
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// NMC command that rescans the enclosures
    pub rescan_command: String,
    /// NMC command that lists LUN to slot mappings
    pub slotmap_command: String,
    pub slotmap_timeout: Duration,
    /// Shell command that reports per-device attributes
    pub discovery_command: String,
    pub discovery_timeout: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rescan_command: "setup jbod rescan".to_string(),
            slotmap_command: "show lun slotmap".to_string(),
            slotmap_timeout: Duration::from_secs(600),
            discovery_command: "hddisco".to_string(),
            discovery_timeout: Duration::from_secs(300),
        }
    }
}

/// Both inventories, built once per run
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub slotmap: SlotMap,
    pub devices: DeviceInfo,
}

// =============================================================================
// Inventory Scanner
// =============================================================================

pub struct InventoryScanner<'a, E: ?Sized> {
    executor: &'a E,
    config: ScannerConfig,
}

impl<'a, E: CommandExecutor + ?Sized> InventoryScanner<'a, E> {
    pub fn new(executor: &'a E, config: ScannerConfig) -> Self {
        Self { executor, config }
    }

    /// Ask the appliance to rescan its enclosures
    pub async fn rescan(&self) -> Result<()> {
        info!("Rescanning JBODs");
        run_nmc(self.executor, &self.config.rescan_command, None).await?;
        Ok(())
    }

    pub async fn slotmap(&self) -> Result<SlotMap> {
        info!("Reading LUN slot map");
        let output = run_nmc(
            self.executor,
            &self.config.slotmap_command,
            Some(self.config.slotmap_timeout),
        )
        .await?;
        let slotmap = parse_slotmap(&output)?;
        info!(
            "Slot map has {} disks in {} enclosures",
            slotmap.len(),
            slotmap.enclosures().count()
        );
        Ok(slotmap)
    }

    pub async fn devices(&self) -> Result<DeviceInfo> {
        info!("Running device discovery");
        let output = run_checked(
            self.executor,
            &self.config.discovery_command,
            Some(self.config.discovery_timeout),
        )
        .await?;
        let devices = parse_hddisco(&output)?;
        info!("Discovered {} devices", devices.len());
        Ok(devices)
    }

    /// Collect the slot map, then device attributes
    pub async fn inventory(&self) -> Result<Inventory> {
        let slotmap = self.slotmap().await?;
        let devices = self.devices().await?;
        Ok(Inventory { slotmap, devices })
    }
}
