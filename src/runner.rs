//! End-to-end run: launch the server, probe it, always shut it down.

use tracing::{error, info, info_span, Instrument};

use crate::config::ProbeConfig;
use crate::suite::{ProbeSuite, SuiteReport};
use crate::transport::spawner::{home_dir, resolve_server_command, spawn_server};
use crate::transport::{RpcClient, ServerClient, ServerProcess};
use crate::Result;

/// Resolve, spawn, and probe the configured server.
///
/// # Errors
///
/// Returns `AppError::Spawn` when the server cannot be launched. Everything
/// after a successful launch is reported through the returned
/// [`SuiteReport`].
pub async fn run(config: &ProbeConfig) -> Result<SuiteReport> {
    let command = resolve_server_command(&config.server, home_dir().as_deref());
    info!(command = %command, dir = %config.server.dir.display(), "starting server");
    let server = spawn_server(&command, &config.server.dir)?;
    Ok(run_spawned(config, server).await)
}

/// Probe an already spawned server, then shut it down.
///
/// Shutdown runs exactly once whatever the suite observed; the handle is
/// consumed by it.
pub async fn run_spawned(config: &ProbeConfig, server: ServerProcess) -> SuiteReport {
    let ServerProcess {
        handle,
        stdin,
        stdout,
    } = server;
    let span = info_span!("probe_run", pid = handle.pid().unwrap_or(0));

    async move {
        let grace = config.timeouts.startup_grace();
        if !grace.is_zero() {
            info!(?grace, "waiting for server start-up");
            tokio::time::sleep(grace).await;
        }

        let mut client: ServerClient = RpcClient::new(stdin, stdout, config.timeouts.response());
        let mut report = ProbeSuite::new(config).run(&mut client).await;

        // Closing stdin first lets servers that exit on EOF stop on their own.
        drop(client);

        info!("stopping server");
        match handle.shutdown(config.timeouts.shutdown()).await {
            Ok(termination) => report.set_termination(termination.describe()),
            Err(err) => {
                error!(%err, "server cleanup failed");
                report.set_termination(format!("cleanup failed: {err}"));
            }
        }

        report
    }
    .instrument(span)
    .await
}
