//! Bounded termination of the server process.
//!
//! On unix the server first receives SIGTERM and gets `grace` to exit on its
//! own. If it is still running afterwards it is killed (SIGKILL) and reaped.
//! Other platforms have no graceful signal, so the kill happens right away.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{info, warn};

use crate::{AppError, Result};

/// How the server went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// Exit status reported by the OS.
    pub status: ExitStatus,
    /// `true` when the graceful path timed out and the child was killed.
    pub forced: bool,
}

impl Termination {
    /// Human-readable exit description.
    #[must_use]
    pub fn describe(&self) -> String {
        let status = describe_exit(self.status);
        if self.forced {
            format!("{status} (killed after grace period)")
        } else {
            status
        }
    }
}

/// Describe an exit status the way operators read it.
#[must_use]
pub fn describe_exit(status: ExitStatus) -> String {
    if status.success() {
        "exited normally (code 0)".to_owned()
    } else {
        status.code().map_or_else(
            || "terminated by signal".to_owned(),
            |c| format!("exited with code {c}"),
        )
    }
}

/// Terminate `child`, escalating to a kill after `grace`.
///
/// A child that already exited is reaped without being signalled.
///
/// # Errors
///
/// Returns `AppError::Io` if polling, killing, or reaping the child fails.
pub async fn terminate(child: &mut Child, grace: Duration) -> Result<Termination> {
    if let Some(status) = child
        .try_wait()
        .map_err(|err| AppError::Io(format!("failed to poll server process: {err}")))?
    {
        info!(status = %describe_exit(status), "server already exited");
        return Ok(Termination {
            status,
            forced: false,
        });
    }

    if send_terminate(child) {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(status = %describe_exit(status), "server stopped");
                return Ok(Termination {
                    status,
                    forced: false,
                });
            }
            Ok(Err(err)) => {
                return Err(AppError::Io(format!("failed to wait for server: {err}")));
            }
            Err(_elapsed) => {
                warn!(?grace, "server ignored SIGTERM, killing");
            }
        }
    }

    child
        .kill()
        .await
        .map_err(|err| AppError::Io(format!("failed to kill server: {err}")))?;
    let status = child
        .wait()
        .await
        .map_err(|err| AppError::Io(format!("failed to reap server: {err}")))?;

    info!(status = %describe_exit(status), "server killed");
    Ok(Termination {
        status,
        forced: true,
    })
}

/// Send SIGTERM. Returns `false` when no graceful signal was delivered.
#[cfg(unix)]
fn send_terminate(child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(raw) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return false;
    };

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(err) => {
            warn!(pid = raw, %err, "failed to send SIGTERM");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(_child: &Child) -> bool {
    false
}
