//! Pool Creation Orchestrator
//!
//! Drives one run end to end:
//! - load the layout file and pick a layout
//! - confirm with the operator
//! - rescan the JBODs and collect the slot map and device attributes
//! - resolve, validate and create each pool of the layout in order
//!
//! The first error stops the run. Pools created before it are left in place.

use super::pool_command::PoolCommandBuilder;
use crate::command::run_checked;
use crate::domain::ports::{CommandExecutor, Prompter, ResolvedPool};
use crate::error::{Error, Result};
use crate::hardware::classification::DeviceClassifier;
use crate::hardware::discovery::{Inventory, InventoryScanner, ScannerConfig};
use crate::layout::{LayoutConfig, LayoutResolver, PoolSpec, DEFAULT_CONFIG_PATH};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

// =============================================================================
// Orchestrator Configuration
// =============================================================================

/// Configuration for a pool creation run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Layout file
    pub config_path: PathBuf,
    /// Layout to use instead of asking
    pub layout: Option<String>,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    /// Resolve and log every command but create nothing
    pub dry_run: bool,
    /// Timeout for each `zpool create`
    pub create_timeout: Option<Duration>,
    pub scanner: ScannerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            layout: None,
            assume_yes: false,
            dry_run: false,
            create_timeout: None,
            scanner: ScannerConfig::default(),
        }
    }
}

// =============================================================================
// Run Results
// =============================================================================

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Operator declined the selected layout
    Declined { layout: String },
    Completed(RunSummary),
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub layout: String,
    /// Pool name -> creation command, in creation order
    pub pools: Vec<(String, String)>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct Orchestrator<E, P> {
    config: OrchestratorConfig,
    executor: E,
    prompter: P,
    classifier: DeviceClassifier,
    builder: PoolCommandBuilder,
}

impl<E, P> Orchestrator<E, P>
where
    E: CommandExecutor,
    P: Prompter,
{
    pub fn new(config: OrchestratorConfig, executor: E, prompter: P) -> Self {
        Self {
            config,
            executor,
            prompter,
            classifier: DeviceClassifier::new(),
            builder: PoolCommandBuilder::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: DeviceClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_builder(mut self, builder: PoolCommandBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run to completion
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let started_at = Utc::now();

        let layouts = LayoutConfig::load(&self.config.config_path)?;
        let layout = self.select_layout(&layouts).await?;

        if !self.confirm_layout(&layout).await? {
            info!("Exiting");
            return Ok(RunOutcome::Declined { layout });
        }

        let scanner = InventoryScanner::new(&self.executor, self.config.scanner.clone());
        scanner.rescan().await?;
        let inventory = scanner.inventory().await?;

        let pools = self.create_pools(layouts.pools(&layout)?, &inventory).await?;

        let finished_at = Utc::now();
        info!(
            "Complete! {} pool(s) in {}s",
            pools.len(),
            (finished_at - started_at).num_seconds()
        );

        Ok(RunOutcome::Completed(RunSummary {
            layout,
            pools,
            dry_run: self.config.dry_run,
            started_at,
            finished_at,
        }))
    }

    async fn select_layout(&mut self, layouts: &LayoutConfig) -> Result<String> {
        if let Some(name) = &self.config.layout {
            layouts.pools(name)?;
            info!("Using layout '{}'", name);
            return Ok(name.clone());
        }

        let names = layouts.names();
        let index = self
            .prompter
            .select("Please select the layout type.", &names)
            .await?;
        Ok(names[index].clone())
    }

    async fn confirm_layout(&mut self, layout: &str) -> Result<bool> {
        if self.config.assume_yes {
            return Ok(true);
        }
        self.prompter
            .confirm(&format!("Continue with '{}' layout?", layout))
            .await
    }

    async fn create_pools(
        &self,
        specs: &[PoolSpec],
        inventory: &Inventory,
    ) -> Result<Vec<(String, String)>> {
        let resolver = LayoutResolver::new(&inventory.slotmap, &inventory.devices, &self.classifier);
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();
        let mut created = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            info!("Building {} device list", spec.label(index));
            let pool = resolver.resolve_pool(spec, index)?;
            claim_devices(&mut claimed, &pool)?;

            let command = self.builder.build(&pool);
            if self.config.dry_run {
                warn!("Dry run, not creating pool {}: {}", pool.name, command);
            } else {
                info!("Creating pool {}", pool.name);
                run_checked(&self.executor, &command, self.config.create_timeout).await?;
            }
            created.push((pool.name, command));
        }

        Ok(created)
    }
}

/// A device may belong to only one pool per run
fn claim_devices(claimed: &mut BTreeMap<String, String>, pool: &ResolvedPool) -> Result<()> {
    for (_, device) in pool.devices() {
        if let Some(owner) = claimed.get(device) {
            return Err(Error::DuplicateDevice {
                device: device.to_string(),
                context: format!("pools '{}' and '{}'", owner, pool.name),
            });
        }
    }
    for (_, device) in pool.devices() {
        claimed.insert(device.to_string(), pool.name.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::prompt::ConsolePrompter;
    use crate::hardware::discovery::scanner::testing::ScriptedExecutor;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SLOTMAP_CMD: &str = "nmc -c \"show lun slotmap\"";
    const RESCAN_CMD: &str = "nmc -c \"setup jbod rescan\"";

    const SLOTMAP: &str = "\
c0t0d0 J1 1 ok
c0t1d0 J1 2 ok
c0t2d0 J1 3 ok
c0t3d0 J1 4 ok
c0t22d0 J1 23 ok
Unmapped disks
";

    const HDDISCO: &str = "\
=c0t0d0
vendor INTEL
product SSDSC2BA80
is_ssd yes
=c0t1d0
vendor INTEL
product SSDSC2BA80
is_ssd yes
=c0t2d0
vendor SEAGATE
product ST4000NM0023
is_ssd no
=c0t3d0
vendor SEAGATE
product ST4000NM0023
is_ssd no
=c0t22d0
vendor STEC
product ZeusRAM
is_ssd yes
";

    const POOL1_CMD: &str = "zpool create -f -m /volumes/pool1 -o failmode=continue \
        -o autoreplace=on -O compression=lz4 pool1 mirror c0t2d0 c0t3d0";

    fn layout_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn executor() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .respond(SLOTMAP_CMD, 0, SLOTMAP)
            .respond("hddisco", 0, HDDISCO)
    }

    fn config(file: &NamedTempFile) -> OrchestratorConfig {
        OrchestratorConfig {
            config_path: file.path().to_path_buf(),
            ..Default::default()
        }
    }

    type TestPrompter = ConsolePrompter<&'static [u8], Vec<u8>>;

    fn prompter(input: &'static str) -> TestPrompter {
        ConsolePrompter::new(input.as_bytes(), Vec::new())
    }

    #[tokio::test]
    async fn test_single_mirror_pool() {
        let file = layout_file(
            r#"{"A": [{"name":"pool1","redundancy":"mirror","vdev":[[["J1",3],["J1",4]]]}]}"#,
        );
        let mut orchestrator = Orchestrator::new(config(&file), executor(), prompter("1\ny\n"));

        let outcome = orchestrator.run().await.unwrap();
        let summary = assert_matches!(outcome, RunOutcome::Completed(s) => s);
        assert_eq!(summary.layout, "A");
        assert_eq!(summary.pools, vec![("pool1".to_string(), POOL1_CMD.to_string())]);

        assert_eq!(
            orchestrator.executor().commands(),
            vec![RESCAN_CMD, SLOTMAP_CMD, "hddisco", POOL1_CMD]
        );
    }

    #[tokio::test]
    async fn test_declined_does_nothing() {
        let file = layout_file(r#"{"A": [], "B": []}"#);
        let mut orchestrator = Orchestrator::new(config(&file), executor(), prompter("2\nn\n"));

        let outcome = orchestrator.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Declined { layout: "B".into() });
        assert!(orchestrator.executor().commands().is_empty());
    }

    #[tokio::test]
    async fn test_log_device_in_vdev_aborts_before_create() {
        let file = layout_file(
            r#"{"A": [{"name":"pool1","redundancy":"mirror","vdev":[[["J1",3],["J1",23]]]}]}"#,
        );
        let mut orchestrator = Orchestrator::new(config(&file), executor(), prompter("1\ny\n"));

        let err = orchestrator.run().await.unwrap_err();
        assert_matches!(err, Error::InvalidDevice { ref device, .. } if device == "c0t22d0");
        assert!(!orchestrator
            .executor()
            .commands()
            .iter()
            .any(|c| c.starts_with("zpool create")));
    }

    #[tokio::test]
    async fn test_later_failure_keeps_earlier_pools() {
        let file = layout_file(
            r#"{"A": [
                {"name":"pool1","redundancy":"mirror","vdev":[[["J1",3],["J1",4]]]},
                {"name":"fast","redundancy":"mirror","vdev":[[["J1",1],["J1",2]]]}
            ]}"#,
        );
        let mut cfg = config(&file);
        cfg.layout = Some("A".into());
        cfg.assume_yes = true;
        cfg.create_timeout = Some(Duration::from_secs(60));
        let mut orchestrator = Orchestrator::new(cfg, executor(), prompter(""));

        // "fast" puts SSDs in a vdev
        let err = orchestrator.run().await.unwrap_err();
        assert!(err.needs_layout_review());

        let commands = orchestrator.executor().commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[3], POOL1_CMD);

        let calls = orchestrator.executor().calls.lock().unwrap().clone();
        assert_eq!(calls[3].1, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let file = layout_file(
            r#"{"A": [
                {"name":"pool1","redundancy":"mirror","vdev":[[["J1",3],["J1",4]]]},
                {"name":"pool2","redundancy":"mirror","vdev":[[["J1",9]]]}
            ]}"#,
        );
        let executor = executor().respond(POOL1_CMD, 1, "cannot create 'pool1': pool already exists");
        let mut cfg = config(&file);
        cfg.layout = Some("A".into());
        cfg.assume_yes = true;
        let mut orchestrator = Orchestrator::new(cfg, executor, prompter(""));

        let err = orchestrator.run().await.unwrap_err();
        assert_matches!(err, Error::NonZeroExit { code: 1, .. });
    }

    #[tokio::test]
    async fn test_dry_run_creates_nothing() {
        let file = layout_file(
            r#"{"A": [{
                "name":"tank","redundancy":"mirror",
                "vdev":[[["J1",3],["J1",4]]],
                "log":[[["J1",23]]],
                "cache":[["J1",1],["J1",2]]
            }]}"#,
        );
        let mut cfg = config(&file);
        cfg.layout = Some("A".into());
        cfg.assume_yes = true;
        cfg.dry_run = true;
        let mut orchestrator = Orchestrator::new(cfg, executor(), prompter(""));

        let summary = assert_matches!(orchestrator.run().await, Ok(RunOutcome::Completed(s)) => s);
        assert!(summary.dry_run);
        assert!(summary.pools[0]
            .1
            .ends_with("tank mirror c0t2d0 c0t3d0 log mirror c0t22d0 cache c0t0d0 c0t1d0"));
        assert_eq!(orchestrator.executor().commands().len(), 3);

        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["layout"], "A");
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["pools"][0][0], "tank");
    }

    #[tokio::test]
    async fn test_device_shared_between_pools() {
        let file = layout_file(
            r#"{"A": [
                {"name":"p1","redundancy":"mirror","vdev":[[["J1",3],["J1",4]]]},
                {"name":"p2","redundancy":"mirror","vdev":[[["J1",4]]]}
            ]}"#,
        );
        let mut cfg = config(&file);
        cfg.layout = Some("A".into());
        cfg.assume_yes = true;
        let mut orchestrator = Orchestrator::new(cfg, executor(), prompter(""));

        let err = orchestrator.run().await.unwrap_err();
        assert_matches!(err, Error::DuplicateDevice { ref device, .. } if device == "c0t3d0");
    }

    #[tokio::test]
    async fn test_unknown_preselected_layout() {
        let file = layout_file(r#"{"A": []}"#);
        let mut cfg = config(&file);
        cfg.layout = Some("B".into());
        let mut orchestrator = Orchestrator::new(cfg, executor(), prompter(""));

        assert_matches!(orchestrator.run().await, Err(Error::UnknownLayout { .. }));
    }

    #[tokio::test]
    async fn test_missing_name_aborts_before_resolution() {
        let file = layout_file(r#"{"A": [{"redundancy":"mirror","vdev":[[["J1",99]]]}]}"#);
        let mut orchestrator = Orchestrator::new(config(&file), executor(), prompter("1\ny\n"));

        assert_matches!(orchestrator.run().await, Err(Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_rescan_failure_stops_run() {
        let file = layout_file(r#"{"A": []}"#);
        let executor = executor().respond(RESCAN_CMD, 1, "");
        let mut orchestrator = Orchestrator::new(config(&file), executor, prompter("1\ny\n"));

        assert_matches!(orchestrator.run().await, Err(Error::NonZeroExit { .. }));
        assert_eq!(orchestrator.executor().commands(), vec![RESCAN_CMD]);
    }
}
