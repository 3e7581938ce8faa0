//! Server process resolution and launch.
//!
//! Resolution order for the command that starts the server:
//! 1. an explicit `server.command` from config or CLI;
//! 2. the release binary at `<dir>/target/release/<binary_name>`;
//! 3. `$HOME/.cargo/bin/cargo run`;
//! 4. `cargo run` from `PATH`.
//!
//! The child is launched with all three stdio streams piped and
//! `kill_on_drop(true)`, so a panic anywhere in the probe still reaps it.
//! Its stderr is drained by a background task into `tracing` under the
//! `server_stderr` target.
//!
//! The child inherits the probe's environment, so `RUST_LOG` and
//! upstream API credentials configured for the server reach it unchanged.
//! Its working directory is `server.dir`, which lets `cargo run` find the
//! server's manifest.
//!
//! A spawn failure (missing binary, missing cargo, permission denied) is
//! returned as `AppError::Spawn` before any request is written; the caller
//! never sees a half-started [`ServerProcess`].

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::transport::shutdown::{self, Termination};
use crate::{AppError, Result};

// ── Command resolution ───────────────────────────────────────────────────────

/// Where a resolved command came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// `server.command` was configured.
    Explicit,
    /// A pre-built release binary was found.
    ReleaseBinary,
    /// Cargo under `$HOME/.cargo/bin`.
    CargoHome,
    /// Bare `cargo` looked up on `PATH`.
    CargoOnPath,
}

/// Fully resolved launch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments passed to `program`.
    pub args: Vec<String>,
    /// Which resolution rule produced this command.
    pub source: CommandSource,
}

impl Display for ServerCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Resolve the command that starts the server.
///
/// `home` is the user's home directory, used to locate a rustup-managed
/// cargo; pass [`home_dir`] in production.
#[must_use]
pub fn resolve_server_command(server: &ServerConfig, home: Option<&Path>) -> ServerCommand {
    if let Some(command) = &server.command {
        return ServerCommand {
            program: PathBuf::from(command),
            args: server.args.clone(),
            source: CommandSource::Explicit,
        };
    }

    let release = release_binary_path(server);
    if release.is_file() {
        return ServerCommand {
            program: release,
            args: Vec::new(),
            source: CommandSource::ReleaseBinary,
        };
    }

    let cargo_run = vec!["run".to_owned()];

    if let Some(home) = home {
        let cargo = home
            .join(".cargo")
            .join("bin")
            .join(format!("cargo{}", std::env::consts::EXE_SUFFIX));
        if cargo.is_file() {
            return ServerCommand {
                program: cargo,
                args: cargo_run,
                source: CommandSource::CargoHome,
            };
        }
    }

    ServerCommand {
        program: PathBuf::from("cargo"),
        args: cargo_run,
        source: CommandSource::CargoOnPath,
    }
}

/// Path where a release build of the server would live.
#[must_use]
pub fn release_binary_path(server: &ServerConfig) -> PathBuf {
    server.dir.join("target").join("release").join(format!(
        "{}{}",
        server.binary_name,
        std::env::consts::EXE_SUFFIX
    ))
}

/// Current user's home directory from the environment.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

// ── Process handle ───────────────────────────────────────────────────────────

/// A running server with its stdio captured.
#[derive(Debug)]
pub struct ServerProcess {
    /// Lifecycle handle; consumed by [`ServerHandle::shutdown`].
    pub handle: ServerHandle,
    /// Server stdin, where requests are written.
    pub stdin: ChildStdin,
    /// Server stdout, where responses are read.
    pub stdout: ChildStdout,
}

/// Exclusive owner of the server child process.
///
/// Shutting down consumes the handle, so the process is terminated at most
/// once; dropping it without shutting down kills the child.
#[derive(Debug)]
pub struct ServerHandle {
    child: Child,
    pid: Option<u32>,
    stderr_drain: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// OS process id captured at launch.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Terminate the server: SIGTERM, bounded wait, then kill.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the process cannot be signalled or reaped.
    pub async fn shutdown(mut self, grace: Duration) -> Result<Termination> {
        let termination = shutdown::terminate(&mut self.child, grace).await?;

        if let Some(drain) = self.stderr_drain.take() {
            // stderr closes once the child is gone; don't hang on a grandchild
            // that inherited it.
            if tokio::time::timeout(grace, drain).await.is_err() {
                debug!(pid = ?self.pid, "stderr drain still open after shutdown");
            }
        }

        Ok(termination)
    }
}

// ── Spawner ──────────────────────────────────────────────────────────────────

/// Launch `command` in `dir` with piped stdio.
///
/// # Errors
///
/// - `AppError::Spawn("failed to spawn server …")`: OS spawn failure
///   (missing binary, permission denied).
/// - `AppError::Spawn("failed to capture server …")`: a pipe was not
///   created.
pub fn spawn_server(command: &ServerCommand, dir: &Path) -> Result<ServerProcess> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|err| {
        AppError::Spawn(format!("failed to spawn server `{command}`: {err}"))
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture server stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture server stdout".into()))?;
    let stderr_drain = child.stderr.take().map(drain_stderr);

    let pid = child.id();
    info!(
        pid = pid.unwrap_or(0),
        command = %command,
        source = ?command.source,
        "server process spawned"
    );

    Ok(ServerProcess {
        handle: ServerHandle {
            child,
            pid,
            stderr_drain,
        },
        stdin,
        stdout,
    })
}

/// Forward each stderr line of the child to `tracing`.
fn drain_stderr(stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(target: "server_stderr", "{line}"),
                Ok(None) => break,
                Err(err) => {
                    debug!(target: "server_stderr", %err, "stderr read failed");
                    break;
                }
            }
        }
    })
}
