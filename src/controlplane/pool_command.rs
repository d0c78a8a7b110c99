//! Pool Command Builder
//!
//! Renders a [`ResolvedPool`] as a single `zpool create` command line.

use crate::domain::ports::ResolvedPool;

// =============================================================================
// Constants
// =============================================================================

const DEFAULT_MOUNT_ROOT: &str = "/volumes";

/// Pool properties (`-o`) set on every pool
const POOL_PROPERTIES: &[(&str, &str)] = &[("failmode", "continue"), ("autoreplace", "on")];

/// Root dataset properties (`-O`) set on every pool
const FS_PROPERTIES: &[(&str, &str)] = &[("compression", "lz4")];

/// Log groups are always mirrored
const LOG_REDUNDANCY: &str = "mirror";

// =============================================================================
// Builder
// =============================================================================

/// Builds `zpool create` command lines
#[derive(Debug, Clone)]
pub struct PoolCommandBuilder {
    mount_root: String,
}

impl Default for PoolCommandBuilder {
    fn default() -> Self {
        Self {
            mount_root: DEFAULT_MOUNT_ROOT.to_string(),
        }
    }
}

impl PoolCommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount pools under `root` instead of `/volumes`
    pub fn with_mount_root(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            mount_root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn mount_point(&self, pool: &str) -> String {
        format!("{}/{}", self.mount_root, pool)
    }

    pub fn build(&self, pool: &ResolvedPool) -> String {
        let mut parts: Vec<String> = vec![
            "zpool create -f".to_string(),
            format!("-m {}", self.mount_point(&pool.name)),
        ];
        parts.extend(POOL_PROPERTIES.iter().map(|(k, v)| format!("-o {}={}", k, v)));
        parts.extend(FS_PROPERTIES.iter().map(|(k, v)| format!("-O {}={}", k, v)));
        parts.push(pool.name.clone());

        parts.extend(pool.vdevs.iter().map(|group| render_group(&pool.redundancy, group)));

        if let Some(log) = &pool.log {
            parts.push("log".to_string());
            parts.extend(log.iter().map(|group| render_group(LOG_REDUNDANCY, group)));
        }

        if let Some(cache) = &pool.cache {
            parts.push("cache".to_string());
            parts.push(cache.join(" "));
        }

        parts.join(" ")
    }
}

fn render_group(redundancy: &str, devices: &[String]) -> String {
    format!("{} {}", redundancy, devices.join(" "))
}
