//! Shell Command Runner
//!
//! Runs command lines through `/bin/sh` with stderr folded into stdout. A
//! command that outlives its timeout is killed together with every process it
//! started, and reaped before the timeout is reported. The same happens when
//! an in-flight `execute` is dropped.

use crate::domain::ports::{CommandExecutor, CommandOutput};
use crate::error::{Error, Result};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

// =============================================================================
// Constants
// =============================================================================

const DEFAULT_SHELL: &str = "/bin/sh";

/// Management CLI used for appliance-level operations
const NMC: &str = "nmc";

// =============================================================================
// Command Runner
// =============================================================================

/// Runs commands in a child shell
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: PathBuf,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different POSIX shell
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn spawn(&self, command: &str) -> std::io::Result<Child> {
        // `exec 2>&1` makes the shell and everything it starts share one pipe
        Command::new(&self.shell)
            .arg("-c")
            .arg(format!("exec 2>&1\n{}", command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
    }

    /// Read all output and wait for exit
    async fn collect(child: &mut Child) -> std::io::Result<(ExitStatus, Vec<u8>)> {
        let mut buf = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut buf).await?;
        }
        let status = child.wait().await?;
        Ok((status, buf))
    }

    /// Kill the child's whole process group and reap the child
    async fn terminate(child: &mut Child) {
        if let Some(pid) = child.id() {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pid, e);
            }
        }
        if let Err(e) = child.kill().await {
            warn!("Failed to reap timed out command: {}", e);
        }
    }
}

/// SIGKILLs a child's process group on drop unless disarmed.
///
/// Must be disarmed once the group leader has been reaped, since its pid may
/// then be reused.
struct GroupGuard(Option<Pid>);

impl GroupGuard {
    fn new(child: &Child) -> Self {
        Self(child.id().map(|pid| Pid::from_raw(pid as i32)))
    }

    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.0.take() {
            debug!("Killing abandoned process group {}", pgid);
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pgid, e);
            }
        }
    }
}

#[async_trait]
impl CommandExecutor for CommandRunner {
    async fn execute(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput> {
        debug!("Executing \"{}\"", command);
        let started = Instant::now();

        let mut child = self.spawn(command).map_err(|source| Error::Execution {
            command: command.to_string(),
            source,
        })?;
        let mut guard = GroupGuard::new(&child);

        let waited = match timeout {
            Some(limit) => tokio::time::timeout(limit, Self::collect(&mut child))
                .await
                .ok(),
            None => Some(Self::collect(&mut child).await),
        };

        let Some(collected) = waited else {
            Self::terminate(&mut child).await;
            guard.disarm();
            return Err(Error::Timeout {
                command: command.to_string(),
                elapsed: started.elapsed(),
            });
        };

        let (status, buf) = collected.map_err(|source| Error::Execution {
            command: command.to_string(),
            source,
        })?;
        guard.disarm();

        let exit_code = exit_code(status);
        let text = String::from_utf8_lossy(&buf);
        let trimmed = text.trim();
        let output = (!trimmed.is_empty()).then(|| trimmed.to_string());

        debug!(
            "\"{}\" exited with {} after {:?}",
            command,
            exit_code,
            started.elapsed()
        );

        Ok(CommandOutput { exit_code, output })
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

// =============================================================================
// Checked Helpers
// =============================================================================

/// Run a command and treat a non-zero exit as an error.
///
/// Returns the trimmed output, empty when the command printed nothing.
pub async fn run_checked<E>(executor: &E, command: &str, timeout: Option<Duration>) -> Result<String>
where
    E: CommandExecutor + ?Sized,
{
    let result = executor.execute(command, timeout).await?;
    if !result.success() {
        return Err(Error::NonZeroExit {
            command: command.to_string(),
            code: result.exit_code,
            output: result.output,
        });
    }
    Ok(result.output.unwrap_or_default())
}

/// Wrap a management-plane command for the NMC shell
pub fn nmc_command(command: &str) -> String {
    format!("{} -c \"{}\"", NMC, command)
}

/// Run a management-plane command through NMC, checked
pub async fn run_nmc<E>(executor: &E, command: &str, timeout: Option<Duration>) -> Result<String>
where
    E: CommandExecutor + ?Sized,
{
    run_checked(executor, &nmc_command(command), timeout).await
}
