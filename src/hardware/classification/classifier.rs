//! Device Classifier
//!
//! Decides which pool role a discovered device may take, based on its
//! hddisco attributes.

use crate::domain::ports::{DeviceInfo, DeviceRole, ATTR_IS_SSD, ATTR_PRODUCT};
use crate::error::Result;
use tracing::trace;

// =============================================================================
// Classifier Configuration
// =============================================================================

/// Configuration for the device classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Products accepted as log devices (exact match)
    pub log_products: Vec<String>,
    /// `is_ssd` value marking a solid-state device
    pub ssd_flag: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            log_products: vec!["ZeusRAM".to_string()],
            ssd_flag: "yes".to_string(),
        }
    }
}

// =============================================================================
// Device Classifier
// =============================================================================

/// Classifies devices into log, cache and data roles
#[derive(Debug, Clone, Default)]
pub struct DeviceClassifier {
    config: ClassifierConfig,
}

impl DeviceClassifier {
    /// Create a new classifier with default config
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn is_log_device(&self, devices: &DeviceInfo, device: &str) -> Result<bool> {
        let product = devices.attribute(device, ATTR_PRODUCT)?;
        Ok(self.config.log_products.iter().any(|p| p == product))
    }

    /// An SSD that is not a log device
    pub fn is_cache_device(&self, devices: &DeviceInfo, device: &str) -> Result<bool> {
        let is_ssd = devices.attribute(device, ATTR_IS_SSD)? == self.config.ssd_flag;
        Ok(is_ssd && !self.is_log_device(devices, device)?)
    }

    /// The one role a device qualifies for
    pub fn classify(&self, devices: &DeviceInfo, device: &str) -> Result<DeviceRole> {
        let role = if self.is_log_device(devices, device)? {
            DeviceRole::Log
        } else if self.is_cache_device(devices, device)? {
            DeviceRole::Cache
        } else {
            DeviceRole::Vdev
        };
        trace!("{} classified as {}", device, role);
        Ok(role)
    }
}
