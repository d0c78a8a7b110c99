//! Layout Resolver
//!
//! Turns a [`PoolSpec`] into a [`ResolvedPool`] by looking every slot up in
//! the slot map and checking that each device suits the role it is given:
//! log groups need log devices, the cache list needs cache devices, and vdev
//! groups need plain data devices.

use super::config::PoolSpec;
use crate::domain::ports::{DeviceInfo, DeviceRole, ResolvedPool, SlotMap, SlotRef};
use crate::error::{Error, Result};
use crate::hardware::classification::DeviceClassifier;
use std::collections::BTreeMap;
use tracing::debug;

pub struct LayoutResolver<'a> {
    slotmap: &'a SlotMap,
    devices: &'a DeviceInfo,
    classifier: &'a DeviceClassifier,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(slotmap: &'a SlotMap, devices: &'a DeviceInfo, classifier: &'a DeviceClassifier) -> Self {
        Self {
            slotmap,
            devices,
            classifier,
        }
    }

    /// Resolve and validate one pool.
    ///
    /// Fields are checked first, then log, cache and vdev devices in that
    /// order. The first failure aborts resolution.
    pub fn resolve_pool(&self, spec: &PoolSpec, index: usize) -> Result<ResolvedPool> {
        let label = spec.label(index);

        let name = required(spec.name.as_deref(), "name", &label)?;
        let redundancy = required(spec.redundancy.as_deref(), "redundancy", &label)?;
        if redundancy.split_whitespace().count() != 1 {
            return Err(Error::Validation(format!(
                "{} has invalid redundancy '{}'",
                label, redundancy
            )));
        }
        let vdev = spec
            .vdev
            .as_deref()
            .ok_or_else(|| Error::Validation(format!("{} has no 'vdev' field", label)))?;

        let log = spec
            .log
            .as_deref()
            .map(|groups| self.resolve_log_groups(groups))
            .transpose()?;
        let cache = spec
            .cache
            .as_deref()
            .map(|slots| self.resolve_cache(slots))
            .transpose()?;
        let vdevs = self.resolve_vdev_groups(vdev)?;

        let pool = ResolvedPool {
            name: name.to_string(),
            redundancy: redundancy.to_string(),
            vdevs,
            cache,
            log,
        };
        check_unique(&pool)?;

        debug!("Resolved {}: {:?}", label, pool);
        Ok(pool)
    }

    /// Resolve mirrored log groups; every device must be a log device
    pub fn resolve_log_groups(&self, groups: &[Vec<SlotRef>]) -> Result<Vec<Vec<String>>> {
        non_empty(groups, DeviceRole::Log)?;
        self.resolve_groups(groups, DeviceRole::Log)
    }

    /// Resolve the striped cache list; every device must be a cache device
    pub fn resolve_cache(&self, slots: &[SlotRef]) -> Result<Vec<String>> {
        non_empty(slots, DeviceRole::Cache)?;
        slots
            .iter()
            .map(|slot| self.resolve_device(slot, DeviceRole::Cache))
            .collect()
    }

    /// Resolve redundancy groups; no device may be a log or cache device
    pub fn resolve_vdev_groups(&self, groups: &[Vec<SlotRef>]) -> Result<Vec<Vec<String>>> {
        if groups.is_empty() {
            return Err(Error::Validation("vdev list is empty".to_string()));
        }
        self.resolve_groups(groups, DeviceRole::Vdev)
    }

    fn resolve_groups(&self, groups: &[Vec<SlotRef>], role: DeviceRole) -> Result<Vec<Vec<String>>> {
        groups
            .iter()
            .map(|group| -> Result<Vec<String>> {
                non_empty(group, role)?;
                group
                    .iter()
                    .map(|slot| self.resolve_device(slot, role))
                    .collect()
            })
            .collect()
    }

    fn resolve_device(&self, slot: &SlotRef, role: DeviceRole) -> Result<String> {
        let device = self.slotmap.resolve(slot)?;

        let suitable = match role {
            DeviceRole::Log => self.classifier.is_log_device(self.devices, device)?,
            DeviceRole::Cache => self.classifier.is_cache_device(self.devices, device)?,
            DeviceRole::Vdev => self.classifier.classify(self.devices, device)? == DeviceRole::Vdev,
        };

        if !suitable {
            let (vendor, product) = self.devices.describe(device);
            return Err(Error::InvalidDevice {
                role: role.to_string(),
                device: device.to_string(),
                vendor,
                product,
            });
        }

        Ok(device.to_string())
    }
}

fn required<'s>(value: Option<&'s str>, field: &str, label: &str) -> Result<&'s str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(Error::Validation(format!("{} has an empty '{}' field", label, field))),
        None => Err(Error::Validation(format!("{} has no '{}' field", label, field))),
    }
}

fn non_empty<T>(items: &[T], role: DeviceRole) -> Result<()> {
    if items.is_empty() {
        return Err(Error::Validation(format!("empty {} group", role)));
    }
    Ok(())
}

/// A device may appear only once per pool
fn check_unique(pool: &ResolvedPool) -> Result<()> {
    let mut seen: BTreeMap<&str, DeviceRole> = BTreeMap::new();
    for (role, device) in pool.devices() {
        if let Some(first) = seen.insert(device, role) {
            return Err(Error::DuplicateDevice {
                device: device.to_string(),
                context: format!("pool '{}' as {} and {}", pool.name, first, role),
            });
        }
    }
    Ok(())
}
